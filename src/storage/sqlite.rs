//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DocumentStore trait.

use crate::document::Document;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, StorageError, StorageResult, StoreStats};
use crate::url::domain_of;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// How long a writer waits for another connection's lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// One stored document as seen by the corpus exporter
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRow {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub source: String,
}

/// SQLite document store
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    /// Opens (or creates) the database at `path`
    ///
    /// Several stores may be opened on the same file at once; WAL mode and a
    /// busy timeout let concurrent crawl tasks write without failing on locks.
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Walks stored documents in insertion order
    ///
    /// Rows with empty content are skipped. At most `limit` rows are visited.
    pub fn visit_corpus<F>(&self, limit: Option<usize>, mut visit: F) -> StorageResult<usize>
    where
        F: FnMut(CorpusRow) -> std::io::Result<()>,
    {
        let limit = limit
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
            .unwrap_or(-1);

        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, content, source FROM documents
             WHERE content != '' ORDER BY id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(CorpusRow {
                id: row.get(0)?,
                url: row.get(1)?,
                title: row.get(2)?,
                content: row.get(3)?,
                source: row.get(4)?,
            })
        })?;

        let mut visited = 0;
        for row in rows {
            visit(row?)?;
            visited += 1;
        }
        Ok(visited)
    }

    fn grouped_counts(&self, column: &str) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {column}, COUNT(*) FROM documents GROUP BY {column}"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (key, count) = row?;
            counts.insert(key, count);
        }
        Ok(counts)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn save(&mut self, document: &Document) -> StorageResult<i64> {
        if document.url.is_empty() {
            return Err(StorageError::Rejected("document has no URL".to_string()));
        }

        let domain = domain_of(&document.url).unwrap_or_default();
        let metadata = serde_json::to_string(&document.metadata)?;
        let links = serde_json::to_string(&document.links)?;
        let headers = serde_json::to_string(&document.fetch.headers)?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO documents (
                url, domain, title, content, html, source, crawler, language,
                metadata, links, content_length, status_code, encoding, content_type,
                response_bytes, headers, download_time_ms, fetched_at, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                       ?15, ?16, ?17, ?18, ?19, ?19)
             ON CONFLICT(url) DO UPDATE SET
                domain = excluded.domain,
                title = excluded.title,
                content = excluded.content,
                html = excluded.html,
                source = excluded.source,
                crawler = excluded.crawler,
                language = excluded.language,
                metadata = excluded.metadata,
                links = excluded.links,
                content_length = excluded.content_length,
                status_code = excluded.status_code,
                encoding = excluded.encoding,
                content_type = excluded.content_type,
                response_bytes = excluded.response_bytes,
                headers = excluded.headers,
                download_time_ms = excluded.download_time_ms,
                fetched_at = excluded.fetched_at,
                updated_at = excluded.updated_at",
            params![
                document.url,
                domain,
                document.title,
                document.content,
                document.html,
                document.source,
                document.crawler,
                document.language,
                metadata,
                links,
                document.content_length() as i64,
                document.fetch.status_code,
                document.fetch.encoding,
                document.fetch.content_type,
                document.fetch.content_length as i64,
                headers,
                document.fetch.download_time_ms as i64,
                document.fetch.fetched_at.to_rfc3339(),
                now,
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM documents WHERE url = ?1",
            params![document.url],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn get_stats(&self) -> StorageResult<StoreStats> {
        let (total_pages, unique_domains, total_content_length): (i64, i64, i64) =
            self.conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT domain), COALESCE(SUM(content_length), 0)
                 FROM documents",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let avg_content_length = if total_pages > 0 {
            total_content_length as f64 / total_pages as f64
        } else {
            0.0
        };

        Ok(StoreStats {
            total_pages: total_pages as u64,
            unique_domains: unique_domains as u64,
            total_content_length: total_content_length as u64,
            avg_content_length,
            pages_by_source: self.grouped_counts("source")?,
            pages_by_crawler: self.grouped_counts("crawler")?,
        })
    }

    fn count_for_source(&self, source_name: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE crawler = ?1",
            params![source_name],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::Sqlite(e))
    }
}
