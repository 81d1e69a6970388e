//! Crawl frontier
//!
//! This module handles:
//! - The FIFO queue of admitted URLs, in discovery order
//! - Deduplication by URL fingerprint
//! - Depth, host and pattern admission rules
//! - The crawl phase state machine
//! - Crawl statistics
//!
//! The frontier has a single owner, the coordinator task. Workers only ever
//! see the `FrontierEntry` values handed to them and report outcomes back.

use crate::config::CrawlJob;
use crate::output::CrawlStats;
use crate::state::{CrawlPhase, EntryState};
use crate::url::{fingerprint, is_same_host, normalize_url, UrlFilter};
use crate::{CrawlError, UrlError};
use std::collections::{HashMap, VecDeque};
use url::Url;

/// A URL admitted to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Canonical URL
    pub url: Url,

    /// Deduplication fingerprint of `url`
    pub fingerprint: String,

    /// Link hops from the seed
    pub depth: u32,

    /// Admission order, starting at 0 for the seed
    pub discovery_order: u64,
}

/// Verdict returned by [`Frontier::enqueue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Queued for dispatch
    Admitted,

    /// Already seen in this job
    Duplicate,

    /// Beyond the maximum depth
    TooDeep,

    /// Host differs from the seed host while same-domain is enabled
    OffDomain,

    /// Rejected by the include/exclude patterns
    Filtered,

    /// The URL could not be canonicalized
    Invalid(UrlError),

    /// The frontier is draining or done
    Closed,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Outcome of one dispatched entry, as reported by a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    /// Fetched and extracted; carries the page's outbound links
    Succeeded { links: Vec<String> },

    /// Network, timeout or HTTP failure
    Failed { reason: String },

    /// Non-HTML content or disallowed by robots.txt
    Skipped { reason: String },
}

/// The crawl frontier and its bookkeeping
#[derive(Debug)]
pub struct Frontier {
    phase: CrawlPhase,
    pending: VecDeque<FrontierEntry>,

    /// Every fingerprint ever admitted, with its lifecycle state
    entries: HashMap<String, EntryState>,

    in_flight: usize,
    dispatched: usize,
    next_order: u64,
    page_limit_hit: bool,

    stats: CrawlStats,
    filter: UrlFilter,
    seed_host: Option<String>,
    same_domain: bool,
    max_depth: u32,
    max_pages: Option<usize>,
}

impl Frontier {
    /// Creates an empty frontier for the job
    pub fn new(job: &CrawlJob) -> Result<Self, CrawlError> {
        Ok(Self {
            phase: CrawlPhase::Seeding,
            pending: VecDeque::new(),
            entries: HashMap::new(),
            in_flight: 0,
            dispatched: 0,
            next_order: 0,
            page_limit_hit: false,
            stats: CrawlStats::new(),
            filter: UrlFilter::new(&job.include_patterns, &job.exclude_patterns)?,
            seed_host: job.seed_host(),
            same_domain: job.same_domain,
            max_depth: job.max_depth,
            max_pages: job.max_pages,
        })
    }

    /// Admits the seed at depth 0 and starts the crawl
    ///
    /// The seed bypasses the include/exclude patterns.
    pub fn seed(&mut self, seed: &Url) -> Result<FrontierEntry, CrawlError> {
        if self.phase != CrawlPhase::Seeding {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Running,
            });
        }

        let url = normalize_url(seed.as_str()).map_err(|source| CrawlError::InvalidSeedUrl {
            url: seed.to_string(),
            source,
        })?;
        let entry = self.admit(url, 0);

        self.transition(CrawlPhase::Running)?;
        Ok(entry)
    }

    /// Offers a discovered URL at the given depth
    pub fn enqueue(&mut self, raw_url: &str, depth: u32) -> Admission {
        if !self.phase.accepts_new_entries() {
            return Admission::Closed;
        }

        let url = match normalize_url(raw_url) {
            Ok(url) => url,
            Err(e) => return Admission::Invalid(e),
        };

        if depth > self.max_depth {
            return Admission::TooDeep;
        }

        if self.entries.contains_key(&fingerprint(&url)) {
            return Admission::Duplicate;
        }

        if self.same_domain {
            let on_seed_host = self
                .seed_host
                .as_deref()
                .is_some_and(|host| is_same_host(&url, host));
            if !on_seed_host {
                return Admission::OffDomain;
            }
        }

        if !self.filter.matches(url.as_str()) {
            return Admission::Filtered;
        }

        self.admit(url, depth);
        Admission::Admitted
    }

    fn admit(&mut self, url: Url, depth: u32) -> FrontierEntry {
        let entry = FrontierEntry {
            fingerprint: fingerprint(&url),
            url,
            depth,
            discovery_order: self.next_order,
        };
        self.next_order += 1;

        self.entries
            .insert(entry.fingerprint.clone(), EntryState::Pending);
        self.pending.push_back(entry.clone());
        tracing::trace!("Admitted {} at depth {}", entry.url, depth);
        entry
    }

    /// Pops up to `n` pending entries in discovery order and marks them in flight
    ///
    /// Once `max_pages` entries have been dispatched the frontier starts
    /// draining and the remaining pending entries are dropped.
    pub fn next_batch(&mut self, n: usize) -> Vec<FrontierEntry> {
        let mut batch = Vec::new();
        if self.phase != CrawlPhase::Running {
            return batch;
        }

        while batch.len() < n {
            if self.max_pages.is_some_and(|max| self.dispatched >= max) {
                self.page_limit_hit = true;
                self.begin_drain();
                break;
            }

            let Some(entry) = self.pending.pop_front() else {
                break;
            };

            self.set_entry_state(&entry.fingerprint, EntryState::InFlight);
            self.in_flight += 1;
            self.dispatched += 1;
            batch.push(entry);
        }

        if self.max_pages.is_some_and(|max| self.dispatched >= max) && !self.pending.is_empty()
        {
            self.page_limit_hit = true;
            self.begin_drain();
        }

        batch
    }

    /// Records the outcome of a dispatched entry
    ///
    /// Outbound links of a successful page are offered at `depth + 1` while the
    /// frontier is still running. Returns the number of newly admitted URLs.
    pub fn report_result(&mut self, entry: &FrontierEntry, outcome: WorkOutcome) -> usize {
        if self.entries.get(&entry.fingerprint) != Some(&EntryState::InFlight) {
            tracing::warn!("Ignoring result for {} which is not in flight", entry.url);
            return 0;
        }
        self.in_flight -= 1;

        let mut admitted = 0;
        match outcome {
            WorkOutcome::Succeeded { links } => {
                self.set_entry_state(&entry.fingerprint, EntryState::Succeeded);
                self.stats.record_success();

                if self.phase == CrawlPhase::Running {
                    let depth = entry.depth + 1;
                    for link in &links {
                        if self.enqueue(link, depth).is_admitted() {
                            admitted += 1;
                        }
                    }
                }
            }
            WorkOutcome::Failed { reason } => {
                tracing::debug!("Failed {}: {}", entry.url, reason);
                self.set_entry_state(&entry.fingerprint, EntryState::Failed);
                self.stats.record_failure();
            }
            WorkOutcome::Skipped { reason } => {
                tracing::debug!("Skipped {}: {}", entry.url, reason);
                self.set_entry_state(&entry.fingerprint, EntryState::Skipped);
                self.stats.record_skip();
            }
        }

        self.maybe_finish();
        admitted
    }

    /// Stops admitting URLs and drops everything still pending
    pub fn begin_drain(&mut self) {
        if !self.phase.can_transition_to(CrawlPhase::Draining) {
            return;
        }
        self.phase = CrawlPhase::Draining;

        let dropped: Vec<FrontierEntry> = self.pending.drain(..).collect();
        for entry in &dropped {
            self.set_entry_state(&entry.fingerprint, EntryState::Dropped);
        }
        if !dropped.is_empty() {
            tracing::debug!("Dropped {} pending URLs", dropped.len());
        }

        self.maybe_finish();
    }

    fn maybe_finish(&mut self) {
        if self.in_flight > 0 {
            return;
        }

        if self.phase == CrawlPhase::Running && self.pending.is_empty() {
            self.phase = CrawlPhase::Draining;
        }
        if self.phase == CrawlPhase::Draining {
            self.phase = CrawlPhase::Done;
        }
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), CrawlError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    fn set_entry_state(&mut self, fingerprint: &str, next: EntryState) {
        if let Some(state) = self.entries.get_mut(fingerprint) {
            debug_assert!(
                state.can_transition_to(next),
                "illegal entry transition {} -> {}",
                state,
                next
            );
            *state = next;
        }
    }

    /// True once nothing is pending and nothing is in flight
    pub fn is_done(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Number of distinct URLs admitted so far
    pub fn seen_count(&self) -> usize {
        self.entries.len()
    }

    /// True if draining started because `max_pages` was reached
    pub fn page_limit_hit(&self) -> bool {
        self.page_limit_hit
    }

    /// Lifecycle state of a URL, if it was ever admitted
    pub fn state_of(&self, url: &str) -> Option<EntryState> {
        let url = normalize_url(url).ok()?;
        self.entries.get(&fingerprint(&url)).copied()
    }
}
