use crate::crawler::DEFAULT_MAX_JITTER;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// MediaWiki API used when a source names a category but no `api-url`
pub const DEFAULT_WIKIPEDIA_API_URL: &str = "https://ru.wikipedia.org/w/api.php";

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceConfig>,
}

/// Global crawl defaults, overridable per source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Minimum time between requests to the same domain (seconds)
    pub delay: f64,

    /// Page budget per source
    #[serde(rename = "max-pages")]
    pub max_pages: u64,

    /// Maximum link depth from the seeds
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Pages with less content than this (characters) are not saved
    #[serde(rename = "min-article-length")]
    pub min_article_length: usize,

    /// Attempts per page for retryable failures
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Checkpoint every this many processed pages
    #[serde(rename = "checkpoint-interval")]
    pub checkpoint_interval: u64,

    /// Log progress every this many seconds
    #[serde(rename = "stats-interval")]
    pub stats_interval: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: "CorpusCrawler/1.0 (+https://example.org/bot)".to_string(),
            delay: 1.0,
            max_pages: 10_000,
            max_depth: 3,
            min_article_length: 1000,
            retry_attempts: 3,
            request_timeout: 30,
            checkpoint_interval: 50,
            stats_interval: 10,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory holding one checkpoint file per source
    #[serde(rename = "checkpoint-dir")]
    pub checkpoint_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "data/corpus.db".to_string(),
            checkpoint_dir: "data".to_string(),
        }
    }
}

/// One crawl source: a name, its seeds and optional overrides
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,

    #[serde(default)]
    pub seeds: Vec<String>,

    /// Wikipedia category whose member articles are added to the seeds
    #[serde(default)]
    pub category: Option<String>,

    /// MediaWiki API endpoint queried for `category`
    #[serde(rename = "api-url", default)]
    pub api_url: Option<String>,

    /// Also seed from the first subcategories of `category`
    #[serde(rename = "include-subcategories", default)]
    pub include_subcategories: bool,

    #[serde(default)]
    pub delay: Option<f64>,

    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u64>,

    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,

    #[serde(rename = "min-article-length", default)]
    pub min_article_length: Option<usize>,
}

/// Category seeding of one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySeeds {
    pub api_url: String,
    /// Category name without the namespace prefix, e.g. `Наука`
    pub category: String,
    pub include_subcategories: bool,
}

/// Fully resolved settings for one crawl instance
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    pub name: String,
    pub seeds: Vec<String>,
    pub category: Option<CategorySeeds>,
    pub user_agent: String,
    pub delay: Duration,
    pub max_pages: u64,
    pub max_depth: u32,
    pub min_article_length: usize,
    pub retry_attempts: u32,
    pub request_timeout: Duration,
    pub checkpoint_interval: u64,
    pub stats_interval: Duration,
    pub checkpoint_path: PathBuf,
    /// Upper bound of the random jitter added to politeness waits
    pub max_jitter: Duration,
}

impl Config {
    /// Looks up a source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Resolves a source against the global defaults
    pub fn settings_for(&self, source: &SourceConfig) -> CrawlSettings {
        let crawler = &self.crawler;
        let delay = source.delay.unwrap_or(crawler.delay).max(0.0);

        CrawlSettings {
            name: source.name.clone(),
            seeds: source.seeds.clone(),
            category: source.category.as_ref().map(|category| CategorySeeds {
                api_url: source
                    .api_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_WIKIPEDIA_API_URL.to_string()),
                category: category.clone(),
                include_subcategories: source.include_subcategories,
            }),
            user_agent: crawler.user_agent.clone(),
            delay: Duration::from_secs_f64(delay),
            max_pages: source.max_pages.unwrap_or(crawler.max_pages),
            max_depth: source.max_depth.unwrap_or(crawler.max_depth),
            min_article_length: source
                .min_article_length
                .unwrap_or(crawler.min_article_length),
            retry_attempts: crawler.retry_attempts,
            request_timeout: Duration::from_secs(crawler.request_timeout),
            checkpoint_interval: crawler.checkpoint_interval,
            stats_interval: Duration::from_secs(crawler.stats_interval),
            checkpoint_path: self.checkpoint_path(&source.name),
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    /// Checkpoint file for the named source
    pub fn checkpoint_path(&self, source_name: &str) -> PathBuf {
        PathBuf::from(&self.output.checkpoint_dir)
            .join(format!("crawler_state_{}.json", source_name))
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.output.database_path)
    }
}
