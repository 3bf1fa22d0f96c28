//! Corpus Crawler: a polite multi-source crawler for building text corpora
//!
//! This crate crawls encyclopedia-style sites, tech blogs and Q&A sites under
//! depth and page budgets, respects robots.txt and per-domain delays, extracts
//! clean article text with source-specific extractors, and survives
//! interruption through JSON checkpoints.

pub mod config;
pub mod crawler;
pub mod document;
pub mod extract;
pub mod frontier;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No valid seed URLs for source '{source_name}'")]
    NoSeeds { source_name: String },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] frontier::CheckpointError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Category seeding error: {0}")]
    Seeds(#[from] crawler::SeedError),

    #[error("Crawl task for '{source_name}' aborted: {message}")]
    Task {
        source_name: String,
        message: String,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlSettings};
pub use document::Document;
pub use state::RunState;
pub use url::{extract_domain, normalize_url};
