//! Rate Limiting Infrastructure
//!
//! Sliding-window limiter over a pluggable [`RateLimitStore`]. The default
//! store keeps per-key hit timestamps in memory; a multi-instance deployment
//! can provide a shared store without touching call sites.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use kernel::AppError;
use tokio::time::Instant;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Trailing window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn per_minutes(max_requests: u32, minutes: u64) -> Self {
        Self::new(max_requests, Duration::from_secs(minutes * 60))
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the oldest counted hit leaves the window. Set when denied.
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    /// Write `X-RateLimit-*` and, when denied, `Retry-After`.
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert("x-ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(self.remaining));
        if let Some(retry) = self.retry_after {
            // Round up so clients never retry a moment too early.
            let secs = retry.as_secs() + u64::from(retry.subsec_nanos() > 0);
            headers.insert("retry-after", HeaderValue::from(secs));
        }
    }
}

/// Storage backend for sliding windows.
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Count hits for `key` inside the trailing window. Below the cap the
    /// current instant is recorded; at the cap nothing is recorded.
    async fn check_and_record(&self, key: &str, config: &RateLimitConfig) -> RateLimitDecision;

    /// Forget every hit for `key`.
    async fn reset(&self, key: &str);

    /// Drop hits older than `window` and evict keys left empty.
    /// Returns the number of keys evicted.
    async fn sweep(&self, window: Duration) -> usize;

    /// Number of keys currently tracked.
    async fn tracked_keys(&self) -> usize;
}

/// In-process store. Safe to share across worker threads.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: DashMap<String, VecDeque<Instant>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn prune(hits: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    while let Some(&oldest) = hits.front() {
        match oldest.checked_add(window) {
            Some(end) if end <= now => {
                hits.pop_front();
            }
            _ => break,
        }
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    async fn check_and_record(&self, key: &str, config: &RateLimitConfig) -> RateLimitDecision {
        let now = Instant::now();
        // The entry guard holds the shard lock, so check and record are atomic per key.
        let mut hits = self.windows.entry(key.to_string()).or_default();
        prune(&mut hits, config.window, now);

        let count = hits.len() as u32;
        if count >= config.max_requests {
            let retry_after = hits
                .front()
                .and_then(|&oldest| oldest.checked_add(config.window))
                .map(|end| end.saturating_duration_since(now));
            return RateLimitDecision {
                allowed: false,
                limit: config.max_requests,
                remaining: 0,
                retry_after,
            };
        }

        hits.push_back(now);
        RateLimitDecision {
            allowed: true,
            limit: config.max_requests,
            remaining: config.max_requests - count - 1,
            retry_after: None,
        }
    }

    async fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    async fn sweep(&self, window: Duration) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, hits| {
            prune(hits, window, now);
            !hits.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    async fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// A configured limiter over a store.
pub struct RateLimiter<S> {
    store: Arc<S>,
    config: RateLimitConfig,
    /// Message for the 429 body.
    message: &'static str,
}

impl<S> Clone for RateLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config,
            message: self.message,
        }
    }
}

impl<S: RateLimitStore + Sync> RateLimiter<S> {
    pub fn new(store: Arc<S>, config: RateLimitConfig) -> Self {
        Self {
            store,
            config,
            message: "Too many requests, please try again later",
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = message;
        self
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub async fn check(&self, key: &str) -> RateLimitDecision {
        self.store.check_and_record(key, &self.config).await
    }

    /// `Ok` when allowed, otherwise the 429 response to return. It already
    /// carries `X-RateLimit-*` and `Retry-After`.
    pub async fn admit(&self, key: &str) -> Result<RateLimitDecision, Response> {
        let decision = self.check(key).await;
        if decision.allowed {
            return Ok(decision);
        }
        tracing::warn!(key, limit = decision.limit, "Rate limit exceeded");
        let mut response = AppError::too_many_requests(self.message).into_response();
        decision.write_headers(response.headers_mut());
        Err(response)
    }

    pub async fn sweep(&self) -> usize {
        self.store.sweep(self.config.window).await
    }
}

impl RateLimiter<InMemoryRateLimitStore> {
    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()), config)
    }
}
