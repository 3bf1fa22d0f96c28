//! HTTP fetcher implementation
//!
//! This module handles all page downloads for the crawler, including:
//! - Building HTTP clients with the configured user agent and browser-like headers
//! - Retry logic for transient failures (timeouts and HTTP 429)
//! - Error classification into terminal fetch failures
//! - Character encoding detection of the response body

use crate::crawler::encoding::decode_body;
use crate::crawler::retry::{RetryKind, RetryPolicy, Sleeper};
use crate::document::FetchMetadata;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Successfully downloaded page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// Decoded HTML
    pub html: String,

    pub metadata: FetchMetadata,
}

/// Terminal download failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// Any non-200, non-429 status; never retried
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// HTTP 429 on every attempt
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Timed out on every attempt
    #[error("timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },

    /// Connection, TLS, redirect or body errors; never retried
    #[error("transport error: {0}")]
    Transport(String),
}

enum Attempt {
    Done(FetchedPage),
    Retry(RetryKind),
    Failed(FetchFailure),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"),
    );

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads pages with bounded retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Decode body, done |
/// | HTTP 429 | Retry after `30s * (attempt + 1)` |
/// | Timeout | Retry after `1s * 2^attempt` |
/// | Other status | Immediate `Status` failure |
/// | Other transport error | Immediate `Transport` failure |
///
/// No sleep follows the final attempt.
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            client,
            policy,
            sleeper,
        }
    }

    /// Downloads a URL
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - HTTP 200 with a decoded body
    /// * `Err(FetchFailure)` - The terminal failure after retries
    pub async fn download(&self, url: &str) -> Result<FetchedPage, FetchFailure> {
        let mut attempt: u32 = 0;

        loop {
            let kind = match self.attempt(url).await {
                Attempt::Done(page) => return Ok(page),
                Attempt::Failed(failure) => return Err(failure),
                Attempt::Retry(kind) => kind,
            };

            match self.policy.backoff(attempt, kind) {
                Some(wait) => {
                    tracing::warn!(
                        "{} for {} (attempt {}/{}), retrying in {:?}",
                        describe(kind),
                        url,
                        attempt + 1,
                        self.policy.max_attempts,
                        wait
                    );
                    self.sleeper.sleep(wait).await;
                    attempt += 1;
                }
                None => {
                    let attempts = attempt + 1;
                    return Err(match kind {
                        RetryKind::Timeout => FetchFailure::TimedOut { attempts },
                        RetryKind::RateLimited => FetchFailure::RateLimited { attempts },
                    });
                }
            }
        }
    }

    async fn attempt(&self, url: &str) -> Attempt {
        let started = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Attempt::Retry(RetryKind::Timeout),
            Err(e) => return Attempt::Failed(FetchFailure::Transport(e.to_string())),
        };

        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => return Attempt::Retry(RetryKind::RateLimited),
            status => {
                return Attempt::Failed(FetchFailure::Status {
                    status: status.as_u16(),
                })
            }
        }

        read_page(response, started).await
    }
}

async fn read_page(response: Response, started: Instant) -> Attempt {
    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();

    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) if e.is_timeout() => return Attempt::Retry(RetryKind::Timeout),
        Err(e) => return Attempt::Failed(FetchFailure::Transport(e.to_string())),
    };

    let (html, encoding) = decode_body(&body, content_type.as_deref());

    Attempt::Done(FetchedPage {
        final_url,
        html,
        metadata: FetchMetadata {
            status_code,
            content_length: body.len(),
            encoding: encoding.name().to_string(),
            content_type,
            headers,
            fetched_at: Utc::now(),
            download_time_ms: started.elapsed().as_millis() as u64,
        },
    })
}

fn describe(kind: RetryKind) -> &'static str {
    match kind {
        RetryKind::Timeout => "Timeout",
        RetryKind::RateLimited => "Rate limited (429)",
    }
}
