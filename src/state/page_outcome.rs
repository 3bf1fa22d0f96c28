/// Result of processing one dequeued URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Extracted and persisted; counts against the page budget
    Saved {
        doc_id: i64,
        /// Outlinks accepted by the frontier
        links_added: usize,
    },

    /// robots.txt forbids the URL; skipped without a failure record
    Disallowed,

    /// Fetched but rejected by a content policy (e.g. too short)
    Rejected { reason: String },

    /// Fetch, extraction or persistence failed
    Failed { reason: String },
}
