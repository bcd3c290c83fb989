//! In-process fixed-window rate limiting.
//!
//! Keys are caller identifier + route. Counters live in this process only,
//! so limits are approximate under multi-instance deployment.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How many windows a stale entry may outlive before being pruned.
const PRUNE_AFTER_WINDOWS: u32 = 4;

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
    /// The window this key was configured with. Pruning must judge each
    /// entry by its own window, not the current caller's.
    window: Duration,
}

/// Fixed-window request counter.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit for `key` and return whether it is within the ceiling.
    ///
    /// The first `limit` hits inside a window succeed; the (N+1)-th fails
    /// until the window rolls over.
    pub fn check(&self, key: &str, limit: u32, window: Duration) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limiter poisoned");

        // Opportunistic prune of long-idle keys, each judged by its own
        // window so short-window traffic cannot reset longer counters.
        windows.retain(|_, w| now.duration_since(w.started) < w.window * PRUNE_AFTER_WINDOWS);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
            window,
        });

        if now.duration_since(entry.started) >= window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count += 1;
        entry.count <= limit
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a limiter key from a caller identifier and route.
pub fn key_from(caller: &str, route: &str) -> String {
    format!("{caller}:{route}")
}
