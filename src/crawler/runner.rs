//! Runs one crawl instance per configured source
//!
//! Every source gets its own tokio task, its own store connection and its own
//! checkpoint file. The only things the tasks share are the database file and
//! the shutdown flag.

use crate::config::Config;
use crate::crawler::coordinator::{Coordinator, RunReport, ShutdownHandle};
use crate::storage::SqliteDocumentStore;
use crate::{CrawlError, Result};

/// How a crawl instance should begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Seed the frontier from the configuration
    Fresh,
    /// Continue from the checkpoint, falling back to `Fresh`
    Resume,
}

/// Result of one source's crawl
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub result: Result<RunReport>,
}

/// Crawls the selected sources concurrently
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `names` - Sources to crawl; empty means all of them
/// * `mode` - Fresh start or resume
/// * `shutdown` - Flag shared by every instance
///
/// # Returns
///
/// * `Ok(Vec<SourceOutcome>)` - One outcome per source, in configuration order
/// * `Err(CrawlError::UnknownSource)` - A requested name is not configured
pub async fn run_sources(
    config: &Config,
    names: &[String],
    mode: StartMode,
    shutdown: ShutdownHandle,
) -> Result<Vec<SourceOutcome>> {
    for name in names {
        if config.source(name).is_none() {
            return Err(CrawlError::UnknownSource(name.clone()));
        }
    }

    let selected = config
        .sources
        .iter()
        .filter(|source| names.is_empty() || names.contains(&source.name));

    let mut handles = Vec::new();
    for source in selected {
        let settings = config.settings_for(source);
        let store = SqliteDocumentStore::new(&config.database_path())?;
        let coordinator =
            Coordinator::new(settings, Box::new(store))?.with_shutdown(shutdown.clone());

        tracing::info!("Launching crawl for source '{}'", source.name);
        let handle = tokio::spawn(async move {
            match mode {
                StartMode::Fresh => coordinator.start().await,
                StartMode::Resume => coordinator.resume().await,
            }
        });
        handles.push((source.name.clone(), handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (source, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(CrawlError::Task {
                source_name: source.clone(),
                message: e.to_string(),
            }),
        };

        if let Err(e) = &result {
            tracing::error!("Crawl for source '{}' failed: {}", source, e);
        }
        outcomes.push(SourceOutcome { source, result });
    }

    Ok(outcomes)
}
