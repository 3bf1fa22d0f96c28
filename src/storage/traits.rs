//! Storage traits and error types
//!
//! This module defines the interface the crawl loop uses to persist
//! finished documents, and the associated error types.

use crate::document::Document;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document rejected: {0}")]
    Rejected(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Aggregate statistics over stored documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total_pages: u64,
    pub unique_domains: u64,
    /// Sum of content lengths in characters
    pub total_content_length: u64,
    pub avg_content_length: f64,
    /// Page count per extractor tag
    pub pages_by_source: BTreeMap<String, u64>,
    /// Page count per crawl instance
    pub pages_by_crawler: BTreeMap<String, u64>,
}

/// Durable sink for finished documents
///
/// Implementations upsert by canonical URL: saving a URL twice keeps one
/// record holding the latest content.
pub trait DocumentStore: Send {
    /// Saves a document
    ///
    /// # Returns
    ///
    /// The document's stable ID
    fn save(&mut self, document: &Document) -> StorageResult<i64>;

    /// Computes aggregate statistics
    fn get_stats(&self) -> StorageResult<StoreStats>;

    /// Number of documents saved by the named source's crawl instance
    fn count_for_source(&self, source_name: &str) -> StorageResult<u64>;

    /// Flushes and releases the store
    fn close(self: Box<Self>) -> StorageResult<()>;
}
