//! Document model shared by the fetcher, extractors and storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transport-level facts about a downloaded page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMetadata {
    /// HTTP status code (always 200 for stored documents)
    pub status_code: u16,

    /// Size of the raw response body in bytes
    pub content_length: usize,

    /// Name of the encoding the body was decoded with
    pub encoding: String,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Response headers
    pub headers: BTreeMap<String, String>,

    /// When the download finished
    pub fetched_at: DateTime<Utc>,

    /// Wall-clock time of the successful attempt
    pub download_time_ms: u64,
}

/// A finished document ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Canonical URL
    pub url: String,

    pub title: String,

    /// Plain-text article content
    pub content: String,

    /// Raw HTML as decoded by the fetcher
    pub html: String,

    /// Extractor-specific metadata (tags, author, description, ...)
    pub metadata: BTreeMap<String, String>,

    /// Absolute outbound links, capped per extractor
    pub links: Vec<String>,

    /// Tag of the extractor that produced the content
    pub source: String,

    /// Language tag, when the extractor can tell
    pub language: Option<String>,

    /// Name of the crawl instance that produced the document
    pub crawler: String,

    pub fetch: FetchMetadata,
}

impl Document {
    /// Content length in characters, the unit of the minimum-length policy
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_length_counts_characters() {
        let doc = Document {
            url: "https://ru.wikipedia.org/wiki/x".to_string(),
            title: "X".to_string(),
            content: "Привет".to_string(),
            html: String::new(),
            metadata: BTreeMap::new(),
            links: vec![],
            source: "wikipedia".to_string(),
            language: Some("ru".to_string()),
            crawler: "wikipedia".to_string(),
            fetch: FetchMetadata {
                status_code: 200,
                content_length: 0,
                encoding: "UTF-8".to_string(),
                content_type: None,
                headers: BTreeMap::new(),
                fetched_at: Utc::now(),
                download_time_ms: 0,
            },
        };

        assert_eq!(doc.content_length(), 6);
        assert_eq!(doc.content.len(), 12);
    }
}
