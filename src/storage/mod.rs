//! Storage module for persisting crawled documents
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Document upserts keyed by canonical URL
//! - Aggregate statistics and corpus iteration

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{CorpusRow, SqliteDocumentStore};
pub use traits::{DocumentStore, StorageError, StorageResult, StoreStats};
