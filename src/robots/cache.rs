//! Per-origin robots.txt cache
//!
//! Each origin's robots.txt is fetched at most once per crawl. Workers share
//! the cache; the first worker to ask for an origin fetches it while the
//! others wait on the same cell.

use crate::robots::{fetch_robots, product_token, RobotsRules};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

/// Shared robots.txt cache keyed by origin
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    agent: String,
    origins: Mutex<HashMap<String, Arc<OnceCell<RobotsRules>>>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// `user_agent` is the full header value; matching uses its product token.
    pub fn new(client: Client, user_agent: &str) -> Self {
        Self {
            client,
            agent: product_token(user_agent).to_string(),
            origins: Mutex::new(HashMap::new()),
        }
    }

    /// Checks a URL against its origin's robots.txt, fetching it on first use
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let rules = self.rules_for(url).await;
        rules.is_allowed(url.as_str(), &self.agent)
    }

    /// Returns the rules for the URL's origin
    pub async fn rules_for(&self, url: &Url) -> RobotsRules {
        let origin = url.origin().ascii_serialization();

        let cell = {
            let mut origins = self.origins.lock().await;
            origins
                .entry(origin)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_init(|| fetch_robots(&self.client, url))
            .await
            .clone()
    }

    /// Number of origins seen so far
    pub async fn len(&self) -> usize {
        self.origins.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
