//! Politeness gate: robots.txt compliance and per-domain request spacing
//!
//! This module handles:
//! - Lazily fetching and caching robots.txt rules per domain
//! - Enforcing a minimum delay between two requests to the same domain
//! - Adding a small random jitter whenever a wait is needed
//!
//! Each domain has its own async slot that is held while waiting, so the
//! spacing guarantee holds even when several tasks share one gate.

use crate::crawler::retry::Sleeper;
use crate::robots::{agent_token, fetch_robots, RobotsRules};
use crate::state::DomainState;
use crate::url::extract_domain;
use rand::Rng;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OnceCell};
use url::Url;

/// Upper bound of the random jitter added to a politeness wait
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(200);

/// Share of a source's recommended delay that is enforced
const RECOMMENDED_DELAY_FACTOR: f64 = 0.8;

type RobotsCell = Arc<OnceCell<Arc<RobotsRules>>>;

/// Decides whether a URL may be fetched and when
pub struct PolitenessGate {
    client: Client,
    agent_token: String,
    min_delay: Duration,
    max_jitter: Duration,
    sleeper: Arc<dyn Sleeper>,
    robots: Mutex<HashMap<String, RobotsCell>>,
    domains: Mutex<HashMap<String, Arc<AsyncMutex<DomainState>>>>,
}

impl PolitenessGate {
    /// Creates a new gate
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests
    /// * `user_agent` - Full user-agent string; its product token selects robots groups
    /// * `min_delay` - Configured minimum spacing between requests to one domain
    /// * `sleeper` - How to wait
    pub fn new(
        client: Client,
        user_agent: &str,
        min_delay: Duration,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            client,
            agent_token: agent_token(user_agent),
            min_delay,
            max_jitter: DEFAULT_MAX_JITTER,
            sleeper,
            robots: Mutex::new(HashMap::new()),
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the upper bound of the random jitter.
    #[must_use]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Checks robots.txt for the URL's domain
    ///
    /// The first call for a domain fetches robots.txt; later calls reuse the
    /// cached rules for the lifetime of the gate. Only the URL path is
    /// matched; the query string is ignored. Unparseable URLs are never
    /// allowed.
    pub async fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(domain) = extract_domain(&parsed) else {
            return false;
        };

        let cell = self.robots_cell(&domain);
        let rules = cell
            .get_or_init(|| async { Arc::new(fetch_robots(&self.client, &parsed).await) })
            .await;

        rules.is_allowed(parsed.path(), &self.agent_token)
    }

    /// Waits until a request to the URL's domain respects the spacing rule
    ///
    /// The required spacing is `max(min_delay, 0.8 * recommended)`. When a
    /// wait is needed, up to `max_jitter` of random jitter is added. The
    /// request time is recorded before returning.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL about to be fetched
    /// * `recommended` - The source's recommended delay
    pub async fn wait_if_needed(&self, url: &str, recommended: Duration) {
        let Some(domain) = Url::parse(url).ok().as_ref().and_then(extract_domain) else {
            return;
        };

        let slot = self.domain_slot(&domain);
        let mut state = slot.lock().await;

        let required = self.required_delay(recommended);
        if let Some(wait) = state.time_until_next_request(required, Instant::now()) {
            let wait = wait + self.jitter();
            tracing::debug!("Politeness wait of {:?} for {}", wait, domain);
            self.sleeper.sleep(wait).await;
        }

        state.record_request(Instant::now());
    }

    /// Spacing enforced for a source with the given recommended delay
    pub fn required_delay(&self, recommended: Duration) -> Duration {
        self.min_delay
            .max(recommended.mul_f64(RECOMMENDED_DELAY_FACTOR))
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    fn robots_cell(&self, domain: &str) -> RobotsCell {
        let mut robots = self.robots.lock().unwrap_or_else(|e| e.into_inner());
        robots
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    fn domain_slot(&self, domain: &str) -> Arc<AsyncMutex<DomainState>> {
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        domains
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(DomainState::new())))
            .clone()
    }
}
