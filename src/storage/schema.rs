//! Database schema definitions
//!
//! This module contains the SQL schema for the document store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per canonical URL; re-crawls update the row in place
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    domain TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    html TEXT NOT NULL,
    source TEXT NOT NULL,
    crawler TEXT NOT NULL,
    language TEXT,
    metadata TEXT NOT NULL,
    links TEXT NOT NULL,
    content_length INTEGER NOT NULL,
    status_code INTEGER NOT NULL,
    encoding TEXT NOT NULL,
    content_type TEXT,
    response_bytes INTEGER NOT NULL,
    headers TEXT NOT NULL,
    download_time_ms INTEGER NOT NULL,
    fetched_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_domain ON documents(domain);
CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);
CREATE INDEX IF NOT EXISTS idx_documents_crawler ON documents(crawler);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
