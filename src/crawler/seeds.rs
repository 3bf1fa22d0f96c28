//! Seeding a crawl from a Wikipedia category
//!
//! Member articles are listed through the MediaWiki `categorymembers` API,
//! following `cmcontinue` tokens until the listing ends or enough pages are
//! known. Optionally the first subcategories are listed too.

use crate::config::CategorySeeds;
use crate::crawler::retry::Sleeper;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Subcategories whose pages are added, in API order
pub const MAX_SUBCATEGORIES: usize = 10;

/// Pages taken from a single subcategory
pub const MAX_PAGES_PER_SUBCATEGORY: usize = 1000;

/// Largest `cmlimit` the API accepts for regular clients
const API_BATCH_SIZE: u32 = 500;

const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between two continuation requests
const API_PAUSE: Duration = Duration::from_millis(100);

/// Errors talking to the MediaWiki API
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Invalid API URL: {0}")]
    ApiUrl(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("MediaWiki API returned status {0}")]
    Status(u16),

    #[error("Malformed MediaWiki API response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberKind {
    Page,
    Subcategory,
}

impl MemberKind {
    fn cmtype(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Subcategory => "subcat",
        }
    }

    fn namespace(self) -> u32 {
        match self {
            Self::Page => 0,
            Self::Subcategory => 14,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<MemberList>,
    #[serde(rename = "continue", default)]
    continuation: Option<Continuation>,
}

#[derive(Debug, Default, Deserialize)]
struct MemberList {
    #[serde(default)]
    categorymembers: Vec<Member>,
}

#[derive(Debug, Deserialize)]
struct Member {
    #[serde(default)]
    pageid: Option<u64>,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct Continuation {
    #[serde(default)]
    cmcontinue: Option<String>,
}

/// Lists article URLs of a Wikipedia category
pub struct CategorySeeder {
    client: Client,
    api_url: Url,
    category: String,
    include_subcategories: bool,
    sleeper: Arc<dyn Sleeper>,
}

impl CategorySeeder {
    /// Creates a seeder for one source
    ///
    /// # Returns
    ///
    /// * `Ok(CategorySeeder)` - Ready to `expand`
    /// * `Err(SeedError::ApiUrl)` - The API URL does not parse
    pub fn new(
        client: Client,
        seeds: &CategorySeeds,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, SeedError> {
        Ok(Self {
            client,
            api_url: Url::parse(&seeds.api_url)?,
            category: seeds.category.clone(),
            include_subcategories: seeds.include_subcategories,
            sleeper,
        })
    }

    /// Lists up to `limit` article URLs
    ///
    /// Pages of the category itself come first, then pages of at most
    /// [`MAX_SUBCATEGORIES`] subcategories when enabled. API errors end the
    /// affected listing early and are logged; whatever was found is returned.
    pub async fn expand(&self, limit: usize) -> Vec<String> {
        tracing::info!("Fetching pages from Wikipedia category '{}'", self.category);
        let mut urls = self.page_urls(&self.category, limit).await;
        tracing::info!("Found {} pages in category '{}'", urls.len(), self.category);

        if self.include_subcategories {
            for subcategory in self.subcategories().await {
                if urls.len() >= limit {
                    break;
                }
                tracing::info!("Fetching pages from subcategory '{}'", subcategory);
                urls.extend(
                    self.page_urls(&subcategory, MAX_PAGES_PER_SUBCATEGORY)
                        .await,
                );
            }
        }

        urls.truncate(limit);
        tracing::info!("Total category pages to seed: {}", urls.len());
        urls
    }

    async fn page_urls(&self, category: &str, cap: usize) -> Vec<String> {
        let members = self.members(category, MemberKind::Page, cap).await;
        members
            .into_iter()
            .filter(|member| member.pageid.is_some() && !member.title.is_empty())
            .map(|member| self.article_url(&member.title))
            .collect()
    }

    async fn subcategories(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .members(&self.category, MemberKind::Subcategory, MAX_SUBCATEGORIES)
            .await
            .into_iter()
            .filter_map(|member| {
                member
                    .title
                    .split_once(':')
                    .map(|(_, name)| name.trim().to_string())
            })
            .filter(|name| !name.is_empty())
            .collect();
        names.truncate(MAX_SUBCATEGORIES);
        names
    }

    /// Follows continuation tokens until `cap` members are known
    async fn members(&self, category: &str, kind: MemberKind, cap: usize) -> Vec<Member> {
        let mut members = Vec::new();
        let mut continuation: Option<String> = None;

        while members.len() < cap {
            let batch = match self.query(category, kind, continuation.as_deref()).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!("Listing of category '{}' stopped: {}", category, e);
                    break;
                }
            };

            members.extend(batch.query.unwrap_or_default().categorymembers);
            continuation = batch.continuation.and_then(|c| c.cmcontinue);
            if continuation.is_none() {
                break;
            }

            tracing::debug!("{} members of '{}' so far", members.len(), category);
            self.sleeper.sleep(API_PAUSE).await;
        }

        members
    }

    async fn query(
        &self,
        category: &str,
        kind: MemberKind,
        continuation: Option<&str>,
    ) -> Result<ApiResponse, SeedError> {
        let mut params: Vec<(&str, String)> = vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("list", "categorymembers".to_string()),
            ("cmtitle", format!("Category:{}", category)),
            ("cmlimit", API_BATCH_SIZE.to_string()),
            ("cmnamespace", kind.namespace().to_string()),
            ("cmtype", kind.cmtype().to_string()),
        ];
        if let Some(token) = continuation {
            params.push(("cmcontinue", token.to_string()));
        }

        let response = self
            .client
            .get(self.api_url.clone())
            .query(&params)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SeedError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `/wiki/<Title>` on the API's host, spaces as underscores
    fn article_url(&self, title: &str) -> String {
        let mut url = self.api_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.set_path(&format!("/wiki/{}", title.replace(' ', "_")));
        url.to_string()
    }
}
