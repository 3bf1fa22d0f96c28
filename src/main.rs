//! Corpus crawler main entry point
//!
//! This is the command-line interface for the corpus crawler.

use anyhow::{bail, Context};
use clap::Parser;
use corpus_crawler::config::{load_config_with_hash, Config};
use corpus_crawler::crawler::{run_sources, ShutdownHandle, StartMode};
use corpus_crawler::output::{export_corpus, print_run_report, print_statistics};
use corpus_crawler::storage::{DocumentStore, SqliteDocumentStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Corpus crawler: builds a text corpus from encyclopedia, blog and Q&A sites
///
/// Each configured source is crawled breadth-first within its depth and page
/// budgets, respecting robots.txt and per-domain delays. Progress is
/// checkpointed so an interrupted crawl can be resumed.
#[derive(Parser, Debug)]
#[command(name = "corpus-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite crawler for building text corpora", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only crawl the named source (repeatable)
    #[arg(long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Resume from checkpoints when present (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start fresh from the seeds, ignoring checkpoints
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_corpus"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_corpus"])]
    stats: bool,

    /// Export stored documents as a one-per-line text corpus and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats"])]
    export_corpus: Option<PathBuf>,

    /// With --export-corpus: also write a JSON table mapping lines to URLs
    #[arg(long, value_name = "PATH", requires = "export_corpus")]
    metadata: Option<PathBuf>,

    /// With --export-corpus: export at most N documents
    #[arg(long, value_name = "N", requires = "export_corpus")]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &config_hash, &cli.sources)
    } else if cli.stats {
        handle_stats(&config)
    } else if let Some(path) = &cli.export_corpus {
        handle_export(&config, path, cli.metadata.as_deref(), cli.limit)
    } else {
        let mode = if cli.fresh && !cli.resume {
            StartMode::Fresh
        } else {
            StartMode::Resume
        };
        handle_crawl(&config, &cli.sources, mode).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpus_crawler=info,warn"),
            1 => EnvFilter::new("corpus_crawler=debug,info"),
            2 => EnvFilter::new("corpus_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, config_hash: &str, only: &[String]) -> anyhow::Result<()> {
    println!("=== Corpus Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Delay: {}s", config.crawler.delay);
    println!("  Max pages per source: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!(
        "  Min article length: {} characters",
        config.crawler.min_article_length
    );
    println!("  Retry attempts: {}", config.crawler.retry_attempts);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Checkpoint every {} pages",
        config.crawler.checkpoint_interval
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Checkpoints: {}", config.output.checkpoint_dir);
    println!("  Config hash: {}", config_hash);

    for name in only {
        if config.source(name).is_none() {
            bail!("Unknown source: {}", name);
        }
    }

    let selected: Vec<_> = config
        .sources
        .iter()
        .filter(|s| only.is_empty() || only.contains(&s.name))
        .collect();

    println!("\nSources ({}):", selected.len());
    for source in &selected {
        let settings = config.settings_for(source);
        println!(
            "  - {} ({} seeds, {} pages, depth {}, delay {:.1}s)",
            settings.name,
            settings.seeds.len(),
            settings.max_pages,
            settings.max_depth,
            settings.delay.as_secs_f64()
        );
        for seed in &settings.seeds {
            println!("    * {}", seed);
        }
        if let Some(category) = &settings.category {
            println!(
                "    category: {} via {}{}",
                category.category,
                category.api_url,
                if category.include_subcategories {
                    " (with subcategories)"
                } else {
                    ""
                }
            );
        }
        println!("    checkpoint: {}", settings.checkpoint_path.display());
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        selected.iter().map(|s| s.seeds.len()).sum::<usize>()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = SqliteDocumentStore::new(&config.database_path())
        .context("Failed to open the document store")?;
    let stats = store.get_stats()?;
    print_statistics(&stats);

    Box::new(store).close()?;
    Ok(())
}

/// Handles the --export-corpus mode
fn handle_export(
    config: &Config,
    corpus_path: &std::path::Path,
    metadata_path: Option<&std::path::Path>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    println!("=== Exporting Corpus ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Corpus: {}", corpus_path.display());
    if let Some(path) = metadata_path {
        println!("Metadata: {}", path.display());
    }
    println!();

    let store = SqliteDocumentStore::new(&config.database_path())
        .context("Failed to open the document store")?;
    let exported = export_corpus(&store, corpus_path, metadata_path, limit)
        .with_context(|| format!("Failed to export corpus to {}", corpus_path.display()))?;

    println!("✓ Exported {} documents", exported);
    Box::new(store).close()?;
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, only: &[String], mode: StartMode) -> anyhow::Result<()> {
    match mode {
        StartMode::Fresh => tracing::info!("Starting fresh crawl (ignoring checkpoints)"),
        StartMode::Resume => tracing::info!("Starting crawl (will resume from checkpoints)"),
    }

    let shutdown = ShutdownHandle::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current pages and checkpointing");
            ctrl_c.request_stop();
        }
    });

    let outcomes = run_sources(config, only, mode, shutdown).await?;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => print_run_report(report),
            Err(e) => {
                failed += 1;
                println!("=== Crawl '{}': failed ===\n  {}", outcome.source, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} sources failed", failed, outcomes.len());
    }

    tracing::info!("Crawl completed successfully");
    Ok(())
}
