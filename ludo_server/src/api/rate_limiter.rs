//! Rate limiter for WebSocket message handling.
//!
//! Limits how many messages a client IP can send within a sliding time
//! window, keeping one noisy client from starving the rest of the server.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rate limiter using a sliding window algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use ludo_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // Allow 30 messages per 10 seconds
    /// let limiter = RateLimiter::new(30, Duration::from_secs(10));
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Check if a request should be allowed
    ///
    /// Returns `true` if the request is allowed, `false` if rate limit exceeded.
    pub fn check(&mut self) -> bool {
        let now = Instant::now();

        // Remove timestamps outside the window
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        // Check if limit exceeded
        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        // Record this request
        self.timestamps.push_back(now);
        true
    }

    /// Get the number of requests in the current window
    #[allow(dead_code)]
    pub fn current_count(&self) -> usize {
        self.timestamps.len()
    }
}
