/// Crawl phase definitions for the frontier state machine
///
/// A crawl moves strictly forward through its phases:
/// `Seeding -> Running -> Draining -> Done`.
use std::fmt;

/// Represents the current phase of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// The seed URL is being admitted; nothing dispatched yet
    Seeding,

    /// Workers are being dispatched and new links admitted
    Running,

    /// No new entries are admitted; waiting for in-flight work
    Draining,

    /// Nothing pending and nothing in flight
    Done,
}

impl CrawlPhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Only single forward steps are legal, plus `Seeding -> Draining` for a
    /// job that stops before anything is dispatched.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Running)
                | (Self::Seeding, Self::Draining)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    /// Returns true while new URLs may be admitted
    pub fn accepts_new_entries(&self) -> bool {
        matches!(self, Self::Seeding | Self::Running)
    }

    /// Returns true once the crawl has fully finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the lowercase name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
