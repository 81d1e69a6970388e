//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! It respects robots.txt directives when crawling websites.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::RobotsRules;

use reqwest::Client;
use url::Url;

/// Fetches robots.txt for the origin of `url`
///
/// Any failure, including a 4xx or 5xx status, yields allow-all rules.
pub async fn fetch_robots(client: &Client, url: &Url) -> RobotsRules {
    let robots_url = match url.join("/robots.txt") {
        Ok(robots_url) => robots_url,
        Err(_) => return RobotsRules::allow_all(),
    };

    tracing::debug!("Fetching {}", robots_url);
    let response = match client.get(robots_url.as_str()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt for {} returned HTTP {}",
            robots_url,
            response.status().as_u16()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(content) => RobotsRules::from_content(&content),
        Err(_) => RobotsRules::allow_all(),
    }
}

/// Returns the product token of a user agent (`web-parser/1.0` → `web-parser`)
pub fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .find(|part| !part.is_empty())
        .unwrap_or(user_agent)
}
