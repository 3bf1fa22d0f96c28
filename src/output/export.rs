//! Flat text corpus export
//!
//! The corpus file holds one document per line, `"<title>. <content>"`, in
//! storage insertion order. Line breaks inside a document become spaces and
//! carriage returns are dropped, so line `n` is always document `n`.
//!
//! The optional metadata file is a JSON array mapping each line back to its
//! origin:
//!
//! ```json
//! [{"doc_id": 0, "title": "Rust", "url": "https://ru.wikipedia.org/wiki/rust", "source": "wikipedia"}]
//! ```

use crate::storage::{CorpusRow, SqliteDocumentStore, StorageResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One line of the corpus, as recorded in the metadata file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusEntry {
    /// Zero-based line number in the corpus file
    pub doc_id: usize,
    pub title: String,
    pub url: String,
    pub source: String,
}

/// Renders a stored document as a single corpus line (without the newline)
pub fn corpus_line(title: &str, content: &str) -> String {
    format!("{}. {}", title.trim(), content.trim())
        .replace('\n', " ")
        .replace('\r', "")
}

/// Writes the corpus (and optionally its metadata) to disk
///
/// # Arguments
///
/// * `store` - The document store to read from
/// * `corpus_path` - Destination of the text corpus
/// * `metadata_path` - Destination of the JSON side table, if wanted
/// * `limit` - Maximum number of stored documents to consider
///
/// # Returns
///
/// The number of lines written
pub fn export_corpus(
    store: &SqliteDocumentStore,
    corpus_path: &Path,
    metadata_path: Option<&Path>,
    limit: Option<usize>,
) -> StorageResult<usize> {
    create_parent_dir(corpus_path)?;
    let mut writer = BufWriter::new(File::create(corpus_path)?);
    let mut entries = Vec::new();

    store.visit_corpus(limit, |row: CorpusRow| {
        if row.content.trim().is_empty() {
            return Ok(());
        }

        writeln!(writer, "{}", corpus_line(&row.title, &row.content))?;
        entries.push(CorpusEntry {
            doc_id: entries.len(),
            title: row.title.trim().to_string(),
            url: row.url,
            source: row.source,
        });

        if entries.len() % 100 == 0 {
            tracing::info!("Exported {} documents...", entries.len());
        }
        Ok(())
    })?;
    writer.flush()?;

    if let Some(path) = metadata_path {
        create_parent_dir(path)?;
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, &entries)?;
    }

    tracing::info!(
        "Exported {} documents to {}",
        entries.len(),
        corpus_path.display()
    );
    Ok(entries.len())
}

fn create_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent),
        None => Ok(()),
    }
}
