use std::time::{Duration, Instant};

/// Tracks request timing for one domain
///
/// The politeness gate keeps one of these per domain behind an async mutex
/// and consults it before every page request.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests made to this domain by this crawl instance
    pub request_count: u32,

    /// Timestamp of the last request to this domain
    pub last_request_time: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with no requests recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was made to this domain
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// # Arguments
    ///
    /// * `min_delay` - Required spacing between two requests to the domain
    /// * `now` - The current time instant
    ///
    /// # Returns
    ///
    /// * `None` - A request can be made now
    /// * `Some(Duration)` - How long to wait first
    pub fn time_until_next_request(&self, min_delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= min_delay {
            None
        } else {
            Some(min_delay - elapsed)
        }
    }
}
