use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use web_parser::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `url` is on exactly the given host
///
/// Subdomains do not match: `blog.example.com` is not `example.com`.
/// Ports are ignored.
pub fn is_same_host(url: &Url, host: &str) -> bool {
    extract_domain(url).is_some_and(|h| h.eq_ignore_ascii_case(host))
}
