//! URL frontier: the set of URLs a crawl instance still has to visit
//!
//! This module handles:
//! - Canonicalizing and deduplicating discovered URLs
//! - Enforcing the maximum crawl depth
//! - FIFO ordering of pending URLs
//! - Saving and restoring the complete state through checkpoints
//!
//! Every canonical URL is in exactly one of three states: unseen, pending
//! (queued) or visited. Visited is final; a URL never re-enters the queue.

mod checkpoint;

pub use checkpoint::{Checkpoint, CheckpointError, FrontierStats, QueuedUrl};

use crate::url::{normalize_url, resolve_url};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::Path;
use url::Url;

/// Number of failure reasons kept in memory and in checkpoints
const MAX_RECORDED_FAILURES: usize = 10_000;

/// A URL handed out by the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

/// Ordered, deduplicated queue of URLs with depth tracking
#[derive(Debug, Clone, Default)]
pub struct UrlFrontier {
    queue: VecDeque<FrontierEntry>,
    pending: HashSet<String>,
    visited: HashSet<String>,
    failures: BTreeMap<String, String>,
    stats: FrontierStats,
    max_depth: u32,
}

impl UrlFrontier {
    /// Creates an empty frontier
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Resets the frontier and enqueues the seeds at depth 0
    ///
    /// Seeds that cannot be normalized, and duplicates, are dropped and
    /// counted as skipped.
    ///
    /// # Returns
    ///
    /// The number of seeds enqueued
    pub fn initialize<S: AsRef<str>>(&mut self, seeds: &[S], max_depth: u32) -> usize {
        *self = Self::new(max_depth);

        let mut added = 0;
        for seed in seeds {
            match normalize_url(seed.as_ref()) {
                Ok(url) if self.push(url.clone(), 0) => {
                    tracing::debug!("Seeded {}", url);
                    added += 1;
                }
                Ok(_) => self.stats.total_skipped += 1,
                Err(e) => {
                    tracing::warn!("Skipping invalid seed '{}': {}", seed.as_ref(), e);
                    self.stats.total_skipped += 1;
                }
            }
        }
        added
    }

    /// Enqueues links discovered on a page at `current_depth`
    ///
    /// Relative links are resolved against `base`. Nothing is added when
    /// `current_depth + 1` exceeds the maximum depth. Already pending or
    /// visited URLs are counted as skipped.
    ///
    /// # Arguments
    ///
    /// * `candidates` - Raw or absolute links
    /// * `current_depth` - Depth of the page the links were found on
    /// * `base` - URL of that page
    ///
    /// # Returns
    ///
    /// The number of URLs added to the queue
    pub fn enqueue<S: AsRef<str>>(&mut self, candidates: &[S], current_depth: u32, base: &str) -> usize {
        let next_depth = current_depth.saturating_add(1);
        if next_depth > self.max_depth {
            return 0;
        }

        let base = Url::parse(base).ok();
        let mut added = 0;

        for candidate in candidates {
            let Some(url) = resolve_url(base.as_ref(), candidate.as_ref()) else {
                self.stats.total_skipped += 1;
                continue;
            };
            if self.push(url, next_depth) {
                added += 1;
            } else {
                self.stats.total_skipped += 1;
            }
        }

        added
    }

    /// Removes the next URL from the queue and marks it visited
    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.pending.remove(&entry.url);
        if self.visited.insert(entry.url.clone()) {
            self.stats.total_visited += 1;
        }
        Some(entry)
    }

    /// Records a URL as visited-with-failure
    ///
    /// The URL is removed from the queue if still pending and will never be
    /// enqueued again. A URL already counted as visited is not counted twice.
    pub fn mark_failed(&mut self, url: &str, reason: &str) {
        let url = normalize_url(url).unwrap_or_else(|_| url.to_string());

        if self.pending.remove(&url) {
            self.queue.retain(|entry| entry.url != url);
        }
        if self.visited.insert(url.clone()) {
            self.stats.total_visited += 1;
        }
        self.stats.total_failed += 1;

        if self.failures.len() < MAX_RECORDED_FAILURES || self.failures.contains_key(&url) {
            self.failures.insert(url, reason.to_string());
        }
    }

    /// Returns the recorded failure reason for a URL
    pub fn failure_reason(&self, url: &str) -> Option<&str> {
        self.failures.get(url).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued URLs
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.pending.contains(url)
    }

    pub fn stats(&self) -> FrontierStats {
        self.stats
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Snapshot of the queue in dequeue order
    pub fn queued(&self) -> impl Iterator<Item = &FrontierEntry> {
        self.queue.iter()
    }

    /// Builds a checkpoint; sets are sorted so equal states encode equally
    pub fn to_checkpoint(&self) -> Checkpoint {
        let mut visited: Vec<String> = self.visited.iter().cloned().collect();
        visited.sort();
        let mut pending: Vec<String> = self.pending.iter().cloned().collect();
        pending.sort();

        Checkpoint {
            url_queue: self
                .queue
                .iter()
                .map(|entry| QueuedUrl(entry.url.clone(), entry.depth))
                .collect(),
            visited_urls: visited,
            pending_urls: pending,
            stats: self.stats,
            max_depth: self.max_depth,
            failed_urls: self.failures.clone(),
        }
    }

    /// Restores a frontier from a checkpoint
    ///
    /// Queued URLs missing from the pending set are added to it. A URL that
    /// is both queued and visited, or queued deeper than `max_depth`, makes
    /// the checkpoint invalid.
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self, CheckpointError> {
        let visited: HashSet<String> = checkpoint.visited_urls.into_iter().collect();
        let mut pending: HashSet<String> = checkpoint.pending_urls.into_iter().collect();
        let mut queue = VecDeque::with_capacity(checkpoint.url_queue.len());

        for QueuedUrl(url, depth) in checkpoint.url_queue {
            if visited.contains(&url) {
                return Err(CheckpointError::Invalid(format!(
                    "{} is both queued and visited",
                    url
                )));
            }
            if depth > checkpoint.max_depth {
                return Err(CheckpointError::Invalid(format!(
                    "{} is queued at depth {} beyond max depth {}",
                    url, depth, checkpoint.max_depth
                )));
            }
            pending.insert(url.clone());
            queue.push_back(FrontierEntry { url, depth });
        }

        Ok(Self {
            queue,
            pending,
            visited,
            failures: checkpoint.failed_urls,
            stats: checkpoint.stats,
            max_depth: checkpoint.max_depth,
        })
    }

    /// Writes the frontier state to a checkpoint file
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        self.to_checkpoint().write(path)
    }

    /// Loads a frontier from a checkpoint file
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        Self::from_checkpoint(Checkpoint::read(path)?)
    }

    fn push(&mut self, url: String, depth: u32) -> bool {
        if self.visited.contains(&url) || self.pending.contains(&url) {
            return false;
        }
        self.pending.insert(url.clone());
        self.queue.push_back(FrontierEntry { url, depth });
        self.stats.total_discovered += 1;
        true
    }
}
