//! Sliding-window rate limiting for the analysis endpoint.
//!
//! Each client identifier keeps the timestamps of its admitted requests. A request
//! is admitted while fewer than `max_requests` timestamps are younger than `window`;
//! a timestamp exactly `window` old counts as expired. Rejected requests are not
//! recorded.

pub mod redis_store;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Admission control keyed by client identifier. Carried in `AppState` as `Arc<dyn RateLimiter>`.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Returns true and records the request if `client_id` is under its limit.
    async fn allow(&self, client_id: &str) -> bool;
}

/// In-process sliding window limiter backed by a sharded concurrent map.
/// The per-key entry lock makes each check-and-record atomic.
pub struct SlidingWindowLimiter {
    requests: DashMap<String, VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check_and_record(&self, client_id: &str) -> bool {
        self.check_and_record_at(client_id, Instant::now())
    }

    pub fn check_and_record_at(&self, client_id: &str, now: Instant) -> bool {
        let window = self.window;
        let mut entry = self.requests.entry(client_id.to_string()).or_default();
        let timestamps = entry.value_mut();

        // Timestamps are pushed in order, so expired ones sit at the front.
        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            warn!(
                client = client_id,
                requests = timestamps.len(),
                max = self.max_requests,
                "Rate limit exceeded"
            );
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Drops identifiers with no live timestamps. Returns how many were removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let window = self.window;
        let before = self.requests.len();
        self.requests.retain(|_, timestamps| {
            timestamps.retain(|t| now.saturating_duration_since(*t) < window);
            !timestamps.is_empty()
        });
        before.saturating_sub(self.requests.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.len()
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn allow(&self, client_id: &str) -> bool {
        self.check_and_record(client_id)
    }
}

/// Periodically evicts idle identifiers so the ledger does not grow without bound.
pub fn spawn_sweeper(limiter: Arc<SlidingWindowLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_at(Instant::now());
            if removed > 0 {
                debug!(
                    removed,
                    remaining = limiter.tracked_clients(),
                    "Swept idle rate-limit entries"
                );
            }
        }
    })
}
