//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the job-level state machine (seeding, running, draining, done)
//! - `EntryState`: the lifecycle of each admitted URL (pending, in flight, terminal)

mod crawl_phase;
mod entry_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use entry_state::EntryState;
