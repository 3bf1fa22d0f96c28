//! Output module for corpus export and crawl reports
//!
//! This module handles:
//! - Exporting stored documents as a flat text corpus
//! - Displaying store statistics and run reports

mod export;
pub mod stats;

pub use export::{corpus_line, export_corpus, CorpusEntry};
pub use stats::{format_run_report, format_statistics, print_run_report, print_statistics};
