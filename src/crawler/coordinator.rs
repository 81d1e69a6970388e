//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Owning the frontier and the statistics
//! - Running a fixed pool of fetch + extract workers
//! - Forwarding finished pages to the output writer
//! - Handling the deadline, the page limit and cancellation
//!
//! Workers never touch the frontier. They pull entries from a shared work
//! channel and push results to a channel read only by the coordinator.

use crate::config::{validate, CrawlJob};
use crate::crawler::extractor::extract;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry, WorkOutcome};
use crate::output::{CrawlStats, OutputWriter, Page, PageMetadata};
use crate::robots::RobotsCache;
use crate::CrawlError;
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use url::Url;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing left to crawl
    Exhausted,
    /// The overall deadline expired; in-flight pages were still collected
    Deadline,
    /// `max_pages` URLs were dispatched
    PageLimit,
    /// The shutdown signal fired; in-flight work was abandoned
    Cancelled,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Exhausted => "exhausted",
            Termination::Deadline => "deadline",
            Termination::PageLimit => "page limit",
            Termination::Cancelled => "cancelled",
        }
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    pub stats: CrawlStats,
    pub termination: Termination,

    /// Pages handed to the output writer
    pub pages_written: usize,

    /// Failure reason if the seed itself could not be fetched
    pub seed_failure: Option<String>,
}

impl CrawlReport {
    /// True when the seed failed and nothing was collected
    pub fn seed_unreachable(&self) -> bool {
        self.seed_failure.is_some() && self.pages_written == 0
    }
}

/// Live counters published while the crawl runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub successful: u64,
    pub failed: u64,
    pub skipped: u64,
    pub queued: usize,
    pub in_flight: usize,
}

/// What a worker sends back for one entry
#[derive(Debug)]
struct WorkResult {
    entry: FrontierEntry,
    outcome: WorkOutcome,
    page: Option<Page>,
}

/// Read-only state shared by every worker
struct WorkerContext {
    job: Arc<CrawlJob>,
    fetcher: Fetcher,
    robots: Option<Arc<RobotsCache>>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    job: Arc<CrawlJob>,
    frontier: Frontier,
    fetcher: Fetcher,
    robots: Option<Arc<RobotsCache>>,
    progress_tx: watch::Sender<ProgressSnapshot>,
}

impl Coordinator {
    /// Creates a new coordinator, validating the job first
    ///
    /// # Errors
    ///
    /// * `CrawlError::Config` - a limit, pattern, selector or header is invalid
    /// * `CrawlError::Reqwest` - the HTTP client could not be built
    pub fn new(job: CrawlJob) -> Result<Self, CrawlError> {
        validate(&job)?;
        let frontier = Frontier::new(&job)?;
        let fetcher = Fetcher::new(&job)?;
        let robots = job
            .respect_robots
            .then(|| Arc::new(RobotsCache::new(fetcher.client().clone(), &job.user_agent)));
        let (progress_tx, _) = watch::channel(ProgressSnapshot::default());

        Ok(Self {
            job: Arc::new(job),
            frontier,
            fetcher,
            robots,
            progress_tx,
        })
    }

    /// Subscribes to live progress counters
    pub fn watch_progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    /// Runs the crawl to completion
    ///
    /// 1. Seed the frontier
    /// 2. Spawn `workers` long-lived worker tasks
    /// 3. Dispatch entries while workers are free; admit links from results
    /// 4. On deadline: stop dispatching and collect in-flight results
    /// 5. On `shutdown`: abandon in-flight work
    /// 6. Finalize the writer with the statistics
    ///
    /// Per-URL failures never make this return an error; they are counted.
    pub async fn run<F>(
        mut self,
        writer: &mut dyn OutputWriter,
        shutdown: F,
    ) -> Result<CrawlReport, CrawlError>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        tracing::info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            self.job.seed,
            self.job.max_depth,
            self.job.workers
        );

        let seed = self.frontier.seed(&self.job.seed)?;

        let workers = self.job.workers;
        let (work_tx, work_rx) = mpsc::channel::<FrontierEntry>(workers);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<WorkResult>();

        let context = Arc::new(WorkerContext {
            job: self.job.clone(),
            fetcher: self.fetcher.clone(),
            robots: self.robots.clone(),
        });

        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    context.clone(),
                    work_rx.clone(),
                    result_tx.clone(),
                ))
            })
            .collect();
        drop(result_tx);

        let outcome = self
            .drive(&seed, writer, &work_tx, &mut result_rx, shutdown, start_time)
            .await;

        drop(work_tx);
        for handle in &handles {
            handle.abort();
        }

        let (termination, seed_failure) = outcome?;
        let stats = *self.frontier.stats();
        writer.finalize(&stats)?;

        tracing::info!(
            "Crawl finished ({}): {} pages in {:?}",
            termination.as_str(),
            writer.page_count(),
            start_time.elapsed()
        );

        Ok(CrawlReport {
            stats,
            termination,
            pages_written: writer.page_count(),
            seed_failure,
        })
    }

    /// The coordinator loop; returns how the crawl ended
    async fn drive<F>(
        &mut self,
        seed: &FrontierEntry,
        writer: &mut dyn OutputWriter,
        work_tx: &mpsc::Sender<FrontierEntry>,
        result_rx: &mut mpsc::UnboundedReceiver<WorkResult>,
        shutdown: F,
        start_time: Instant,
    ) -> Result<(Termination, Option<String>), CrawlError>
    where
        F: Future<Output = ()>,
    {
        let mut termination = Termination::Exhausted;
        let mut seed_failure = None;
        let mut completed: u64 = 0;

        let deadline = self.job.deadline.map(|d| tokio::time::Instant::now() + d);
        let deadline_sleep = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_sleep);
        tokio::pin!(shutdown);
        let mut deadline_armed = deadline.is_some();

        self.dispatch(work_tx).await;

        while !self.frontier.is_done() {
            tokio::select! {
                result = result_rx.recv() => {
                    let Some(result) = result else {
                        tracing::warn!("All workers exited with work outstanding");
                        break;
                    };

                    if result.entry.fingerprint == seed.fingerprint {
                        if let WorkOutcome::Failed { reason } = &result.outcome {
                            seed_failure = Some(reason.clone());
                        }
                    }

                    if let Some(page) = result.page {
                        writer.record_page(page)?;
                    }
                    self.frontier.report_result(&result.entry, result.outcome);

                    completed += 1;
                    if completed % 10 == 0 {
                        let rate = completed as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                            completed,
                            self.frontier.pending_len(),
                            rate
                        );
                    }
                }
                _ = &mut deadline_sleep, if deadline_armed => {
                    deadline_armed = false;
                    tracing::info!(
                        "Deadline reached, waiting for {} in-flight pages",
                        self.frontier.in_flight()
                    );
                    termination = Termination::Deadline;
                    self.frontier.begin_drain();
                }
                _ = &mut shutdown => {
                    tracing::info!(
                        "Shutdown requested, abandoning {} in-flight pages",
                        self.frontier.in_flight()
                    );
                    termination = Termination::Cancelled;
                    self.frontier.begin_drain();
                    break;
                }
            }

            self.dispatch(work_tx).await;
            self.publish_progress();
        }

        if termination == Termination::Exhausted && self.frontier.page_limit_hit() {
            termination = Termination::PageLimit;
        }

        self.publish_progress();
        Ok((termination, seed_failure))
    }

    /// Hands entries to idle workers
    async fn dispatch(&mut self, work_tx: &mpsc::Sender<FrontierEntry>) {
        let free = self
            .job
            .workers
            .saturating_sub(self.frontier.in_flight());
        if free == 0 {
            return;
        }

        for entry in self.frontier.next_batch(free) {
            tracing::debug!("Dispatching {} (depth {})", entry.url, entry.depth);
            if work_tx.send(entry).await.is_err() {
                tracing::warn!("Work channel closed");
                return;
            }
        }
    }

    fn publish_progress(&self) {
        let stats = self.frontier.stats();
        self.progress_tx.send_replace(ProgressSnapshot {
            successful: stats.successful,
            failed: stats.failed,
            skipped: stats.skipped,
            queued: self.frontier.pending_len(),
            in_flight: self.frontier.in_flight(),
        });
    }
}

/// Long-lived worker: pulls entries until the work channel closes
async fn worker_loop(
    id: usize,
    context: Arc<WorkerContext>,
    work_rx: Arc<Mutex<mpsc::Receiver<FrontierEntry>>>,
    result_tx: mpsc::UnboundedSender<WorkResult>,
) {
    loop {
        let entry = {
            let mut rx = work_rx.lock().await;
            rx.recv().await
        };
        let Some(entry) = entry else {
            break;
        };

        tracing::trace!("Worker {} processing {}", id, entry.url);
        let result = process_entry(&context, entry).await;
        if result_tx.send(result).is_err() {
            break;
        }
    }
    tracing::trace!("Worker {} exiting", id);
}

/// Processes a single entry
///
/// 1. Checks robots.txt
/// 2. Fetches the page
/// 3. Extracts title, content and links on the blocking pool
async fn process_entry(context: &WorkerContext, entry: FrontierEntry) -> WorkResult {
    if let Some(robots) = &context.robots {
        if !robots.is_allowed(&entry.url).await {
            tracing::info!("URL {} disallowed by robots.txt", entry.url);
            return WorkResult {
                entry,
                outcome: WorkOutcome::Skipped {
                    reason: "disallowed by robots.txt".to_string(),
                },
                page: None,
            };
        }
    }

    let fetch_result = context.fetcher.fetch(&entry.url).await;

    match fetch_result {
        FetchResult::Success {
            final_url,
            status_code,
            content_type,
            body,
        } => {
            let base_url = Url::parse(&final_url).unwrap_or_else(|_| entry.url.clone());
            let options = context.job.extract.clone();
            let extracted =
                tokio::task::spawn_blocking(move || extract(&body, &base_url, &options)).await;

            let extracted = match extracted {
                Ok(extracted) => extracted,
                Err(e) => {
                    tracing::warn!("Extraction task failed for {}: {}", entry.url, e);
                    return WorkResult {
                        entry,
                        outcome: WorkOutcome::Failed {
                            reason: format!("extraction failed: {}", e),
                        },
                        page: None,
                    };
                }
            };

            let mut page = Page {
                url: entry.url.to_string(),
                title: extracted.title,
                content: extracted.content,
                metadata: PageMetadata {
                    depth: entry.depth,
                    status: status_code,
                    timestamp: Utc::now(),
                    content_type,
                    extra: BTreeMap::new(),
                },
                links: extracted.links,
                discovery_order: entry.discovery_order,
            };
            if final_url != entry.url.as_str() {
                page = page.with_extra("final_url", final_url);
            }

            WorkResult {
                outcome: WorkOutcome::Succeeded {
                    links: page.links.clone(),
                },
                page: Some(page),
                entry,
            }
        }
        FetchResult::ContentMismatch { .. } => {
            tracing::debug!("Skipping {}: {}", entry.url, fetch_result.describe());
            WorkResult {
                entry,
                outcome: WorkOutcome::Skipped {
                    reason: fetch_result.describe(),
                },
                page: None,
            }
        }
        other => {
            tracing::warn!("Failed to fetch {}: {}", entry.url, other.describe());
            WorkResult {
                entry,
                outcome: WorkOutcome::Failed {
                    reason: other.describe(),
                },
                page: None,
            }
        }
    }
}
