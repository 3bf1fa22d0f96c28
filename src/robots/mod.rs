//! Robots.txt handling module
//!
//! This module provides functionality for fetching and parsing robots.txt
//! files. Caching per domain lives in the politeness gate.

mod parser;

pub use parser::{agent_token, RobotsRules};

use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Timeout for a single robots.txt request
pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the robots.txt URL for the site serving `url`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use corpus_crawler::robots::robots_url;
///
/// let url = Url::parse("https://habr.com/ru/articles/1/").unwrap();
/// assert_eq!(robots_url(&url).unwrap(), "https://habr.com/robots.txt");
/// ```
pub fn robots_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}://{}:{}/robots.txt", url.scheme(), host, port)),
        None => Some(format!("{}://{}/robots.txt", url.scheme(), host)),
    }
}

/// Fetches and parses robots.txt for the site serving `url`
///
/// Any failure (non-200 status, network error, undecodable body) yields a
/// permissive rule set; the caller caches whatever comes back.
///
/// # Arguments
///
/// * `client` - The HTTP client (already carrying our user agent)
/// * `url` - Any URL on the target site
///
/// # Returns
///
/// The parsed rules, or `RobotsRules::allow_all()` on failure
pub async fn fetch_robots(client: &Client, url: &Url) -> RobotsRules {
    let Some(robots_url) = robots_url(url) else {
        return RobotsRules::allow_all();
    };

    let response = match client.get(&robots_url).timeout(ROBOTS_TIMEOUT).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    if response.status() != StatusCode::OK {
        tracing::debug!(
            "No robots.txt at {} (status {})",
            robots_url,
            response.status().as_u16()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let rules = RobotsRules::parse(&body);
            tracing::debug!("Loaded robots.txt from {}", robots_url);
            rules
        }
        Err(e) => {
            tracing::debug!("Failed to read {}: {}", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}
