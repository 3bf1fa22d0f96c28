//! Configuration module for the corpus crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use corpus_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! for source in &config.sources {
//!     println!("{}: {} seeds", source.name, source.seeds.len());
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategorySeeds, Config, CrawlSettings, CrawlerConfig, OutputConfig, SourceConfig,
    DEFAULT_WIKIPEDIA_API_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
