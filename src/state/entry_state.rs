/// Frontier entry state definitions for tracking crawl progress
///
/// Every admitted URL fingerprint carries one of these states until the job ends.
use std::fmt;

/// Represents the current state of a frontier entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    // ===== Active States =====
    /// Admitted and waiting in the pending queue
    Pending,

    /// Dispatched to a worker and not yet reported
    InFlight,

    // ===== Terminal States =====
    /// Fetched and extracted successfully
    Succeeded,

    /// Fetch failed (network, timeout, HTTP error)
    Failed,

    /// Not extracted: non-HTML content or disallowed by robots.txt
    Skipped,

    /// Admitted but never dispatched because the crawl stopped early
    Dropped,
}

impl EntryState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InFlight)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: EntryState) -> bool {
        match self {
            Self::Pending => matches!(next, Self::InFlight | Self::Dropped),
            Self::InFlight => matches!(next, Self::Succeeded | Self::Failed | Self::Skipped),
            _ => false,
        }
    }

    /// Returns the lowercase name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Dropped => "dropped",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
