//! URL handling module
//!
//! This module provides the canonical URL form used for deduplication,
//! relative link resolution, and the domain key used by robots caching and
//! per-domain politeness.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{domain_of, extract_domain};
pub use normalize::{normalize_url, resolve_url};
