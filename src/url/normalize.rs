use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Normalizes a URL into its canonical crawl form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Reject URLs without a host
/// 4. Lowercase the host and drop the scheme's default port
/// 5. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Keep a trailing slash when present
///    - Empty path becomes /
/// 6. Remove fragment (everything after #)
/// 7. Remove tracking query parameters (`utm_*` and a fixed list)
/// 8. Sort remaining query parameters by key, keeping the relative order of
///    repeated keys
/// 9. Remove empty query string (trailing ?)
///
/// # Examples
///
/// ```
/// use web_parser::url::normalize_url;
///
/// let url = normalize_url("HTTP://EXAMPLE.COM:80/a//b/../c/?b=2&utm_source=x&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/a/c/?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // The url crate lowercases hosts and strips default ports for special
    // schemes while parsing; only the empty-host case is left to reject.
    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and repeated slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    let trailing_slash = path.ends_with('/');
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", normalized_segments.join("/"));
    if trailing_slash {
        result.push('/');
    }
    result
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    // Stable sort keeps repeated keys in their original order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_keeps_scheme() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_keeps_trailing_slash() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page/");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result = normalize_url("https://example.com/page?utm_source=twitter").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_sort_query_params() {
        let result = normalize_url("https://example.com/page?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?a=1&b=2");
    }

    #[test]
    fn test_repeated_keys_keep_order() {
        let result = normalize_url("https://example.com/?tag=z&id=1&tag=a").unwrap();
        assert_eq!(result.as_str(), "https://example.com/?id=1&tag=z&tag=a");
    }

    #[test]
    fn test_query_values_stay_encoded() {
        let result = normalize_url("https://example.com/search?q=a+b%26c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/search?q=a+b%26c");
    }

    #[test]
    fn test_normalize_path_with_dots() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_default_port_removed() {
        let result = normalize_url("https://example.com:443/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");

        let result = normalize_url("http://example.com:8080/").unwrap();
        assert_eq!(result.as_str(), "http://example.com:8080/");
    }

    #[test]
    fn test_mixed_query_params() {
        let result = normalize_url(
            "https://example.com/page?keep=yes&utm_medium=email&another=value&fbclid=123",
        )
        .unwrap();
        assert_eq!(
            result.as_str(),
            "https://example.com/page?another=value&keep=yes"
        );
    }

    #[test]
    fn test_empty_query_removed() {
        let result = normalize_url("https://example.com/page?").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));

        let result = normalize_url("mailto:someone@example.com");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(normalize_url("not a url"), Err(UrlError::Parse(_))));
        assert!(normalize_url("/relative/path").is_err());
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///path//to///page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/path/to/page");
    }

    #[test]
    fn test_all_tracking_params() {
        for param in ["utm_source", "utm_custom", "fbclid", "gclid", "mc_eid", "ref", "source"] {
            let url = format!("https://example.com/page?{}=value", param);
            let result = normalize_url(&url).unwrap();
            assert_eq!(
                result.as_str(),
                "https://example.com/page",
                "Failed to remove {}",
                param
            );
        }
    }

    proptest! {
        #[test]
        fn prop_normalization_is_idempotent(
            segments in proptest::collection::vec("[a-zA-Z0-9._-]{0,6}", 0..5),
            params in proptest::collection::vec(("[a-z]{1,4}", "[a-z0-9]{0,4}"), 0..4),
            fragment in proptest::option::of("[a-z]{1,5}"),
        ) {
            let mut raw = format!("https://Example.COM/{}", segments.join("/"));
            if !params.is_empty() {
                let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                raw.push('?');
                raw.push_str(&query.join("&"));
            }
            if let Some(fragment) = fragment {
                raw.push('#');
                raw.push_str(&fragment);
            }

            let once = normalize_url(&raw).unwrap();
            let twice = normalize_url(once.as_str()).unwrap();
            prop_assert_eq!(once.as_str(), twice.as_str());
            prop_assert!(once.fragment().is_none());
            prop_assert_eq!(once.host_str(), Some("example.com"));
        }
    }
}
