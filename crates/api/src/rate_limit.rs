use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Callers beyond this count trigger a prune of buckets that have sat idle
/// long enough to be full again.
const MAX_TRACKED_CALLERS: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    touched: Instant,
}

/// Per-caller token bucket: each caller starts with a full burst of
/// `max_requests` tokens that refill continuously over `window`. A request
/// spends one token; an empty bucket means the caller is throttled.
#[derive(Debug, Clone)]
pub struct CallerThrottle {
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
    burst: f64,
    refill_per_sec: f64,
}

impl CallerThrottle {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        let burst = max_requests.max(1) as f64;
        let window_secs = window.as_secs_f64().max(f64::EPSILON);

        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            burst,
            refill_per_sec: burst / window_secs,
        }
    }

    pub fn try_acquire(&self, caller: &str) -> bool {
        self.acquire_at(caller, Instant::now())
    }

    fn acquire_at(&self, caller: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock();

        if buckets.len() >= MAX_TRACKED_CALLERS && !buckets.contains_key(caller) {
            let idle_cutoff = Duration::from_secs_f64(self.burst / self.refill_per_sec);
            buckets.retain(|_, bucket| now.saturating_duration_since(bucket.touched) < idle_cutoff);
        }

        let bucket = buckets.entry(caller.to_string()).or_insert(TokenBucket {
            tokens: self.burst,
            touched: now,
        });

        let elapsed = now.saturating_duration_since(bucket.touched).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.burst);
        bucket.touched = now;

        if bucket.tokens < 1.0 {
            return false;
        }
        bucket.tokens -= 1.0;
        true
    }
}
