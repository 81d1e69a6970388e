//! Robots.txt rule matching
//!
//! Matching is delegated to the robotstxt crate, which follows Google's
//! reference implementation.

use robotstxt::DefaultMatcher;

/// Robots.txt rules for one origin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    /// Raw robots.txt content
    content: String,
    /// Set when the file was missing or could not be fetched
    allow_all: bool,
}

impl RobotsRules {
    /// Creates rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates permissive rules that allow everything
    ///
    /// Used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if these rules allow everything outright
    pub fn is_allow_all(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Checks if a URL is allowed for the given product token
    ///
    /// `url` may be absolute or a bare path.
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }
}
