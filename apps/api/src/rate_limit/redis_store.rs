//! Redis-backed sliding window, shared by every server instance.
//!
//! Each client gets a sorted set of request timestamps (milliseconds). One Lua script
//! evicts, counts and records atomically; the key expires after one idle window.

use std::time::Duration;

use redis::{Client, Script};
use async_trait::async_trait;
use tracing::{error, warn};
use uuid::Uuid;

use crate::rate_limit::RateLimiter;

const KEY_PREFIX: &str = "cv-analyzer:ratelimit:";

// KEYS[1] = ledger key; ARGV = now_ms, window_ms, max_requests, member
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
if redis.call('ZCARD', key) >= limit then
    return 0
end
redis.call('ZADD', key, now, ARGV[4])
redis.call('PEXPIRE', key, window)
return 1
"#;

pub struct RedisRateLimiter {
    client: Client,
    script: Script,
    max_requests: usize,
    window: Duration,
}

impl RedisRateLimiter {
    pub fn new(client: Client, max_requests: usize, window: Duration) -> Self {
        Self {
            client,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
            max_requests,
            window,
        }
    }

    async fn check_and_record(&self, client_id: &str) -> redis::RedisResult<bool> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        let member = format!("{now_ms}-{}", Uuid::new_v4());

        let admitted: i64 = self
            .script
            .key(ledger_key(client_id))
            .arg(now_ms)
            .arg(self.window.as_millis() as u64)
            .arg(self.max_requests as u64)
            .arg(member)
            .invoke_async(&mut con)
            .await?;

        Ok(admitted == 1)
    }
}

fn ledger_key(client_id: &str) -> String {
    format!("{KEY_PREFIX}{client_id}")
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn allow(&self, client_id: &str) -> bool {
        match self.check_and_record(client_id).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(client = client_id, max = self.max_requests, "Rate limit exceeded");
                false
            }
            Err(e) => {
                // Fail open on cache errors.
                error!("Redis rate limiter unavailable, admitting request: {e}");
                true
            }
        }
    }
}
