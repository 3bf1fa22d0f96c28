//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RunState`: Lifecycle of one crawl instance (idle, running, and the three ways it ends)
//! - `PageOutcome`: What happened to a single dequeued URL
//! - `DomainState`: Per-domain request timing used by the politeness gate

mod domain_state;
mod page_outcome;
mod run_state;

// Re-export main types
pub use domain_state::DomainState;
pub use page_outcome::PageOutcome;
pub use run_state::RunState;
