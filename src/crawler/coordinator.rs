//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop of one crawl instance, including:
//! - Seeding the frontier or restoring it from a checkpoint
//! - Coordinating robots checks, politeness waits, fetching and extraction
//! - Enforcing the page budget and the minimum article length
//! - Periodic progress logging and checkpointing
//! - Cooperative shutdown
//!
//! An instance is strictly sequential: one URL is in flight at a time.

use crate::config::CrawlSettings;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::politeness::PolitenessGate;
use crate::crawler::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::crawler::seeds::CategorySeeder;
use crate::document::Document;
use crate::extract::ExtractorRegistry;
use crate::frontier::{FrontierEntry, FrontierStats, UrlFrontier};
use crate::state::{PageOutcome, RunState};
use crate::storage::DocumentStore;
use crate::url::extract_domain;
use crate::{CrawlError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use url::Url;

/// Reason recorded for pages below the minimum article length
pub const CONTENT_TOO_SHORT: &str = "content too short";

/// Cloneable flag used to stop one or more crawl instances
///
/// A stop request is honored between pages: the page in flight finishes and
/// a checkpoint is written before the instance returns.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary of a finished crawl instance
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub source: String,
    pub state: RunState,
    /// Pages saved, including those saved by earlier runs when resumed
    pub pages_collected: u64,
    /// URLs dequeued in this run
    pub pages_processed: u64,
    pub pages_failed: u64,
    pub pages_rejected: u64,
    pub pages_disallowed: u64,
    pub frontier: FrontierStats,
    pub queue_remaining: usize,
    pub elapsed: Duration,
}

/// Orchestrates one crawl instance
pub struct Coordinator {
    settings: CrawlSettings,
    frontier: UrlFrontier,
    gate: PolitenessGate,
    fetcher: Fetcher,
    registry: ExtractorRegistry,
    seeder: Option<CategorySeeder>,
    store: Box<dyn DocumentStore>,
    shutdown: ShutdownHandle,
    state: RunState,
    pages_collected: u64,
    pages_processed: u64,
    pages_failed: u64,
    pages_rejected: u64,
    pages_disallowed: u64,
    started: Instant,
    last_stats: Instant,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `settings` - Resolved settings of the source to crawl
    /// * `store` - Where finished documents go; closed when the crawl ends
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to `start` or `resume`
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(settings: CrawlSettings, store: Box<dyn DocumentStore>) -> Result<Self> {
        Self::with_sleeper(settings, store, Arc::new(TokioSleeper))
    }

    /// Creates a coordinator whose politeness waits and retry backoffs go
    /// through `sleeper`
    pub fn with_sleeper(
        settings: CrawlSettings,
        store: Box<dyn DocumentStore>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let client = build_http_client(&settings.user_agent, settings.request_timeout)?;

        let gate = PolitenessGate::new(
            client.clone(),
            &settings.user_agent,
            settings.delay,
            Arc::clone(&sleeper),
        )
        .with_max_jitter(settings.max_jitter);
        let seeder = settings
            .category
            .as_ref()
            .map(|category| CategorySeeder::new(client.clone(), category, Arc::clone(&sleeper)))
            .transpose()?;
        let fetcher = Fetcher::new(client, RetryPolicy::new(settings.retry_attempts), sleeper);

        let now = Instant::now();
        Ok(Self {
            frontier: UrlFrontier::new(settings.max_depth),
            settings,
            gate,
            fetcher,
            registry: ExtractorRegistry::new(),
            seeder,
            store,
            shutdown: ShutdownHandle::new(),
            state: RunState::Idle,
            pages_collected: 0,
            pages_processed: 0,
            pages_failed: 0,
            pages_rejected: 0,
            pages_disallowed: 0,
            started: now,
            last_stats: now,
        })
    }

    /// Replaces the shutdown flag, typically with one shared by all sources
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn frontier(&self) -> &UrlFrontier {
        &self.frontier
    }

    /// Starts a fresh crawl from the configured seeds
    ///
    /// A source with a category first lists up to `2 * max_pages` of its
    /// articles and appends them to the seeds. Writes an initial checkpoint
    /// before the first page is fetched.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The crawl loop ended (stopped, exhausted or budget reached)
    /// * `Err(CrawlError::NoSeeds)` - No seed survived normalization
    pub async fn start(self) -> Result<RunReport> {
        let span = tracing::info_span!("crawl", source = %self.settings.name);
        self.seed_and_run().instrument(span).await
    }

    /// Continues a crawl from its checkpoint
    ///
    /// A missing or unreadable checkpoint falls back to [`Coordinator::start`].
    pub async fn resume(mut self) -> Result<RunReport> {
        let span = tracing::info_span!("crawl", source = %self.settings.name);

        async move {
            match UrlFrontier::load(&self.settings.checkpoint_path) {
                Ok(frontier) => {
                    self.frontier = frontier;
                    self.pages_collected = match self.store.count_for_source(&self.settings.name) {
                        Ok(count) => count,
                        Err(e) => {
                            tracing::warn!("Could not count stored pages, budget restarts at 0: {}", e);
                            0
                        }
                    };
                    tracing::info!(
                        "Resumed from {}: {} queued, {} visited, {} pages already collected",
                        self.settings.checkpoint_path.display(),
                        self.frontier.len(),
                        self.frontier.visited_count(),
                        self.pages_collected
                    );
                    self.run_loop().await
                }
                Err(e) if e.is_not_found() => {
                    tracing::info!("No checkpoint found, starting fresh");
                    self.seed_and_run().await
                }
                Err(e) => {
                    tracing::warn!("Checkpoint unusable ({}), starting fresh", e);
                    self.seed_and_run().await
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn seed_and_run(mut self) -> Result<RunReport> {
        let mut seeds = self.settings.seeds.clone();
        if let Some(seeder) = &self.seeder {
            let limit = usize::try_from(self.settings.max_pages.saturating_mul(2))
                .unwrap_or(usize::MAX);
            seeds.extend(seeder.expand(limit).await);
        }

        let seeded = self.frontier.initialize(&seeds, self.settings.max_depth);

        if seeded == 0 {
            tracing::error!("None of the {} seeds is a valid URL", seeds.len());
            let source_name = self.settings.name.clone();
            if let Err(e) = self.store.close() {
                tracing::warn!("Failed to close store: {}", e);
            }
            return Err(CrawlError::NoSeeds { source_name });
        }

        tracing::info!(
            "Frontier seeded with {} URLs (max depth {}, budget {} pages)",
            seeded,
            self.settings.max_depth,
            self.settings.max_pages
        );
        self.write_checkpoint();
        self.run_loop().await
    }

    /// Runs the main crawl loop until a terminal state is reached
    async fn run_loop(mut self) -> Result<RunReport> {
        self.state = RunState::Running;
        self.started = Instant::now();
        self.last_stats = self.started;

        let checkpoint_interval = self.settings.checkpoint_interval.max(1);

        let final_state = loop {
            if self.shutdown.is_stop_requested() {
                tracing::info!("Stop requested");
                break RunState::Stopped;
            }

            if self.pages_collected >= self.settings.max_pages {
                tracing::info!("Page budget of {} reached", self.settings.max_pages);
                break RunState::BudgetReached;
            }

            let Some(entry) = self.frontier.dequeue() else {
                tracing::info!("Frontier is empty");
                break RunState::Exhausted;
            };

            let outcome = self.process_url(&entry).await;
            self.record_outcome(&entry, outcome);
            self.pages_processed += 1;

            self.maybe_log_progress();

            if self.pages_processed % checkpoint_interval == 0 {
                self.write_checkpoint();
            }
        };

        Ok(self.finish(final_state))
    }

    /// Processes a single URL
    ///
    /// This method:
    /// 1. Checks robots.txt
    /// 2. Waits for the domain's politeness slot
    /// 3. Fetches the page, re-checking robots.txt if it redirected to
    ///    another host, and extracts it
    /// 4. Applies the minimum article length
    /// 5. Saves the document and enqueues its links
    async fn process_url(&mut self, entry: &FrontierEntry) -> PageOutcome {
        let url = entry.url.as_str();

        if !self.gate.is_allowed(url).await {
            return PageOutcome::Disallowed;
        }

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return PageOutcome::Failed {
                    reason: format!("invalid URL: {}", e),
                }
            }
        };

        self.gate
            .wait_if_needed(url, self.registry.recommended_delay(&parsed))
            .await;

        let page = match self.fetcher.download(url).await {
            Ok(page) => page,
            Err(failure) => {
                return PageOutcome::Failed {
                    reason: failure.to_string(),
                }
            }
        };

        let page_url = Url::parse(&page.final_url).unwrap_or_else(|_| parsed.clone());
        if extract_domain(&page_url) != extract_domain(&parsed)
            && !self.gate.is_allowed(page_url.as_str()).await
        {
            tracing::debug!("{} redirected to {}, which robots.txt disallows", url, page_url);
            return PageOutcome::Disallowed;
        }

        let extracted = self.registry.extract(&page_url, &page.html);

        let document = Document {
            url: entry.url.clone(),
            title: extracted.title,
            content: extracted.content,
            html: page.html,
            metadata: extracted.metadata,
            links: extracted.links,
            source: extracted.source.tag().to_string(),
            language: extracted.language,
            crawler: self.settings.name.clone(),
            fetch: page.metadata,
        };

        let length = document.content_length();
        if length < self.settings.min_article_length {
            tracing::debug!(
                "{} has {} characters of content, minimum is {}",
                url,
                length,
                self.settings.min_article_length
            );
            return PageOutcome::Rejected {
                reason: CONTENT_TOO_SHORT.to_string(),
            };
        }

        let doc_id = match self.store.save(&document) {
            Ok(id) => id,
            Err(e) => {
                return PageOutcome::Failed {
                    reason: format!("failed to save to database: {}", e),
                }
            }
        };

        let links_added = if entry.depth < self.frontier.max_depth() {
            self.frontier
                .enqueue(&document.links, entry.depth, page_url.as_str())
        } else {
            0
        };

        PageOutcome::Saved {
            doc_id,
            links_added,
        }
    }

    fn record_outcome(&mut self, entry: &FrontierEntry, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Saved {
                doc_id,
                links_added,
            } => {
                self.pages_collected += 1;
                tracing::info!(
                    "[{}/{}] Saved {} as #{} (depth {}, {} new links)",
                    self.pages_collected,
                    self.settings.max_pages,
                    entry.url,
                    doc_id,
                    entry.depth,
                    links_added
                );
            }
            PageOutcome::Disallowed => {
                self.pages_disallowed += 1;
                tracing::debug!("{} disallowed by robots.txt", entry.url);
            }
            PageOutcome::Rejected { reason } => {
                self.pages_rejected += 1;
                tracing::debug!("Rejected {}: {}", entry.url, reason);
                self.frontier.mark_failed(&entry.url, &reason);
            }
            PageOutcome::Failed { reason } => {
                self.pages_failed += 1;
                tracing::warn!("Failed {}: {}", entry.url, reason);
                self.frontier.mark_failed(&entry.url, &reason);
            }
        }
    }

    fn maybe_log_progress(&mut self) {
        if self.last_stats.elapsed() < self.settings.stats_interval {
            return;
        }
        self.last_stats = Instant::now();

        let elapsed = self.started.elapsed();
        let rate = self.pages_processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        let stats = self.frontier.stats();
        tracing::info!(
            "Progress: {} collected, {} processed, {} queued, {} failed, {:.2} pages/sec",
            self.pages_collected,
            self.pages_processed,
            self.frontier.len(),
            stats.total_failed,
            rate
        );
    }

    /// Checkpoint write failures are logged; the crawl goes on
    fn write_checkpoint(&self) {
        match self.frontier.save(&self.settings.checkpoint_path) {
            Ok(()) => tracing::debug!(
                "Checkpoint written to {}",
                self.settings.checkpoint_path.display()
            ),
            Err(e) => tracing::warn!(
                "Failed to write checkpoint {}: {}",
                self.settings.checkpoint_path.display(),
                e
            ),
        }
    }

    fn finish(mut self, state: RunState) -> RunReport {
        self.state = state;
        self.write_checkpoint();

        let report = RunReport {
            source: self.settings.name.clone(),
            state,
            pages_collected: self.pages_collected,
            pages_processed: self.pages_processed,
            pages_failed: self.pages_failed,
            pages_rejected: self.pages_rejected,
            pages_disallowed: self.pages_disallowed,
            frontier: self.frontier.stats(),
            queue_remaining: self.frontier.len(),
            elapsed: self.started.elapsed(),
        };

        tracing::info!(
            "Crawl {}: {} pages collected, {} processed in {:?}",
            state,
            report.pages_collected,
            report.pages_processed,
            report.elapsed
        );
        match self.store.get_stats() {
            Ok(stats) => tracing::info!(
                "Store holds {} pages from {} domains",
                stats.total_pages,
                stats.unique_domains
            ),
            Err(e) => tracing::warn!("Failed to read store statistics: {}", e),
        }

        if let Err(e) = self.store.close() {
            tracing::warn!("Failed to close store: {}", e);
        }

        report
    }
}
