use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::RateLimit;

/// Sliding-window limiter bounding a venue worker to `max` job starts per
/// rolling `duration` window. Unlike the HTTP-facing rate limiter this is
/// modeled on, `acquire` never rejects — it sleeps until a slot frees, since
/// a venue worker's job queue is meant to smooth bursts, not bounce them.
pub struct RateLimiter {
    max: usize,
    window: Duration,
    starts: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        RateLimiter {
            max: limit.max as usize,
            window: limit.duration,
            starts: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut starts = self.starts.lock().await;
                let now = Instant::now();
                while starts.front().is_some_and(|t| now.duration_since(*t) >= self.window) {
                    starts.pop_front();
                }
                if starts.len() < self.max {
                    starts.push_back(now);
                    return;
                }
                self.window - now.duration_since(*starts.front().unwrap())
            };
            tokio::time::sleep(wait).await;
        }
    }
}
