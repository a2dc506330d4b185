//! Per-domain politeness delay between requests.
//!
//! Requests to the same host are spaced by at least the configured delay;
//! requests to different hosts (a blog's CDN-hosted feed, for instance) do not
//! wait on each other.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use harvester_core::fetch::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_millis(300));
//!
//! // First request proceeds immediately
//! limiter.acquire("https://blog.example.com/page/1").await;
//!
//! // Second request to the same host waits for the delay
//! limiter.acquire("https://blog.example.com/page/2").await;
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Per-domain rate limiter shared by every request of a run.
///
/// Wrapped in `Arc` by [`PageClient`](super::PageClient) so concurrent post
/// extractions share the same per-domain clock.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    disabled: bool,
    /// Values are `Arc`ed so the `DashMap` shard lock is released before awaiting.
    domains: DashMap<String, Arc<Mutex<Option<Instant>>>>,
}

impl RateLimiter {
    /// Creates a rate limiter enforcing `delay` between requests to one host.
    /// A zero delay never waits.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            disabled: delay.is_zero(),
            domains: DashMap::new(),
        }
    }

    /// Waits until a request to `url`'s host is allowed, then records it.
    ///
    /// The first request to a host proceeds immediately.
    #[instrument(level = "trace", skip(self), fields(domain))]
    pub async fn acquire(&self, url: &str) {
        if self.disabled {
            return;
        }

        let domain = extract_domain(url);
        tracing::Span::current().record("domain", domain.as_str());

        let state = self
            .domains
            .entry(domain.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        let mut last_request = state.lock().await;
        if let Some(previous) = *last_request {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                let wait = self.delay.saturating_sub(elapsed);
                debug!(domain = %domain, delay_ms = wait.as_millis(), "applying politeness delay");
                tokio::time::sleep(wait).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

/// Extracts the lowercased host from a URL, or `"unknown"` when it has none.
///
/// ```
/// use harvester_core::fetch::extract_domain;
///
/// assert_eq!(extract_domain("https://Blog.Example.com/2024/01/hello"), "blog.example.com");
/// assert_eq!(extract_domain("not a url"), "unknown");
/// ```
#[must_use]
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| "unknown".to_string())
}
