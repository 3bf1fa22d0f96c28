//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and encoding detection
//! - robots.txt compliance and per-domain politeness
//! - Seeding from Wikipedia categories
//! - The per-source crawl loop
//! - Running several sources concurrently

mod coordinator;
mod encoding;
mod fetcher;
mod politeness;
mod retry;
mod runner;
mod seeds;

pub use coordinator::{Coordinator, RunReport, ShutdownHandle, CONTENT_TOO_SHORT};
pub use encoding::{charset_from_content_type, decode_body};
pub use fetcher::{build_http_client, FetchFailure, FetchedPage, Fetcher};
pub use politeness::{PolitenessGate, DEFAULT_MAX_JITTER};
pub use retry::{RetryKind, RetryPolicy, Sleeper, TokioSleeper};
pub use runner::{run_sources, SourceOutcome, StartMode};
pub use seeds::{CategorySeeder, SeedError, MAX_PAGES_PER_SUBCATEGORY, MAX_SUBCATEGORIES};
