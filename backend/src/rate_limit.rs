use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::debug;

const WINDOW: Duration = Duration::from_secs(60);

/// Tracked clients before expired windows are swept out.
const MAX_TRACKED_CLIENTS: usize = 10_000;

struct Window {
    count: u32,
    started: Instant,
}

/// Fixed one-minute window per client key.
pub struct RateLimiter {
    limit: u32,
    max_tracked: usize,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    /// `limit` requests per minute; 0 disables limiting.
    pub fn new(limit: u32) -> Self {
        Self::with_max_tracked(limit, MAX_TRACKED_CLIENTS)
    }

    fn with_max_tracked(limit: u32, max_tracked: usize) -> Self {
        Self {
            limit,
            max_tracked,
            windows: DashMap::new(),
        }
    }

    /// Counts `cost` requests for `key` and reports whether they fit.
    pub fn check(&self, key: &str, cost: u32) -> bool {
        self.check_at(key, cost, Instant::now())
    }

    fn check_at(&self, key: &str, cost: u32, now: Instant) -> bool {
        if self.limit == 0 {
            return true;
        }

        if self.windows.len() >= self.max_tracked && !self.windows.contains_key(key) {
            self.sweep(now);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) > WINDOW {
            entry.count = 0;
            entry.started = now;
        }

        entry.count = entry.count.saturating_add(cost);
        entry.count <= self.limit
    }

    /// Drops every window that has already expired.
    fn sweep(&self, now: Instant) {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.duration_since(window.started) <= WINDOW);
        debug!(
            "Rate limiter swept {} expired clients",
            before.saturating_sub(self.windows.len())
        );
    }
}
