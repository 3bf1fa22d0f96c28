//! Extractor registry: turns raw HTML into structured documents
//!
//! This module contains:
//! - `SourceKind`: the closed set of built-in extractors
//! - `ExtractorRegistry`: picks the first matching extractor in priority order
//! - Generic fallback when a specialized extractor cannot handle a page
//!
//! Every registry has the Generic extractor as its final, catch-all entry.

mod common;
mod generic;
mod habr;
mod stackoverflow;
mod wikipedia;

pub use common::collapse_whitespace;

use scraper::Html;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Metadata key recording why a page fell back to the Generic extractor
pub const FALLBACK_METADATA_KEY: &str = "extraction_fallback";

/// Errors raised by a specialized extractor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("required element not found: {0}")]
    MissingElement(&'static str),

    #[error("invalid selector {0}")]
    Selector(String),
}

/// Built-in extractors, in dispatch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Wikipedia,
    Habr,
    StackOverflow,
    Generic,
}

impl SourceKind {
    /// Specialized extractors in priority order; Generic is implied last
    pub const SPECIALIZED: [SourceKind; 3] =
        [SourceKind::Wikipedia, SourceKind::Habr, SourceKind::StackOverflow];

    /// Tag stored with every document
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Wikipedia => "wikipedia",
            Self::Habr => "habr",
            Self::StackOverflow => "stackoverflow",
            Self::Generic => "generic",
        }
    }

    /// Delay the site asks crawlers to keep between requests
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::Wikipedia => Duration::from_millis(1000),
            Self::Habr => Duration::from_millis(2000),
            Self::StackOverflow => Duration::from_millis(2000),
            Self::Generic => Duration::from_millis(1500),
        }
    }

    /// Returns true if this extractor handles the URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default();
        match self {
            Self::Wikipedia => wikipedia::matches(host),
            Self::Habr => habr::matches(host),
            Self::StackOverflow => stackoverflow::matches(host),
            Self::Generic => true,
        }
    }

    fn extract(&self, url: &Url, document: &Html) -> Result<ExtractedPage, ExtractError> {
        match self {
            Self::Wikipedia => wikipedia::extract(url, document),
            Self::Habr => habr::extract(url, document),
            Self::StackOverflow => stackoverflow::extract(url, document),
            Self::Generic => Ok(generic::extract(url, document)),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Output of an extractor
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// Extractor that produced this page
    pub source: SourceKind,

    pub title: String,

    /// Whitespace-normalized article text
    pub content: String,

    pub metadata: BTreeMap<String, String>,

    /// Absolute, canonical outbound links (already capped)
    pub links: Vec<String>,

    pub language: Option<String>,
}

/// Ordered set of extractors with a Generic catch-all
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    specialized: Vec<SourceKind>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self {
            specialized: SourceKind::SPECIALIZED.to_vec(),
        }
    }
}

impl ExtractorRegistry {
    /// Creates a registry with every built-in extractor
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the first extractor whose matcher accepts the URL
    pub fn select(&self, url: &Url) -> SourceKind {
        self.specialized
            .iter()
            .copied()
            .find(|kind| kind.matches(url))
            .unwrap_or(SourceKind::Generic)
    }

    /// Recommended delay of the extractor selected for the URL
    pub fn recommended_delay(&self, url: &Url) -> Duration {
        self.select(url).recommended_delay()
    }

    /// Extracts a page, falling back to Generic if the selected extractor fails
    ///
    /// # Arguments
    ///
    /// * `url` - The page URL (used for link resolution and matching)
    /// * `html` - Decoded HTML
    ///
    /// # Returns
    ///
    /// The extracted page; a fallback result is tagged `generic` and carries
    /// the original failure under [`FALLBACK_METADATA_KEY`]
    pub fn extract(&self, url: &Url, html: &str) -> ExtractedPage {
        let document = Html::parse_document(html);
        let kind = self.select(url);

        match kind.extract(url, &document) {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!("{} extractor failed for {}: {}, using generic", kind, url, e);
                let mut page = generic::extract(url, &document);
                page.metadata
                    .insert(FALLBACK_METADATA_KEY.to_string(), format!("{}: {}", kind, e));
                page
            }
        }
    }
}
