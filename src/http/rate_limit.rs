//! Rate limiting implementation
//!
//! Call budget of at most `calls_per_window` live calls per window (60
//! seconds by default). The window count resets when the window elapses, or
//! when the budget is spent and the caller has slept out the rest of it.
//!
//! The fixed window alone lets a burst at the end of one window and a burst
//! at the start of the next share a 60s span. A short log of the last
//! `calls_per_window` call times closes that gap: a call also waits until
//! the oldest logged call is a full window old.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Length of the accounting window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of live calls per window
    pub calls_per_window: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            calls_per_window: 60,
            window: DEFAULT_WINDOW,
        }
    }
}

impl RateLimiterConfig {
    /// Create a config allowing `calls_per_window` calls per 60 seconds
    pub fn new(calls_per_window: u32) -> Self {
        Self {
            calls_per_window,
            ..Default::default()
        }
    }

    /// Override the window length
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

/// Accounting state for the current window
#[derive(Debug)]
struct RateWindow {
    window_start: Instant,
    call_count: u32,
    /// Times of the most recent live calls, oldest first, capped at the budget
    recent: VecDeque<Instant>,
}

impl RateWindow {
    /// Start a new window; the call log survives resets
    fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.call_count = 0;
    }

    /// When the next call may go out without putting more than `budget`
    /// calls inside one rolling window
    fn rolling_deadline(&self, budget: u32, window: Duration) -> Option<Instant> {
        if self.recent.len() < budget as usize {
            return None;
        }
        self.recent.front().map(|oldest| *oldest + window)
    }
}

/// Windowed rate limiter
///
/// Owned by one client; the window is behind an async mutex, and a
/// [`WindowPermit`] keeps it locked until the caller records its call, so
/// concurrent callers are serialized.
#[derive(Debug)]
pub struct RateLimiter {
    calls_per_window: u32,
    window: Duration,
    state: Mutex<RateWindow>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            calls_per_window: config.calls_per_window.max(1),
            window: config.window,
            state: Mutex::new(RateWindow {
                window_start: Instant::now(),
                call_count: 0,
                recent: VecDeque::with_capacity(config.calls_per_window.max(1) as usize),
            }),
        }
    }

    /// Wait until a live call may be made
    ///
    /// Must be called immediately before the call; the returned permit
    /// records it.
    pub async fn throttle(&self) -> WindowPermit<'_> {
        let mut window = self.state.lock().await;
        let elapsed = window.window_start.elapsed();

        if elapsed < self.window {
            if window.call_count >= self.calls_per_window {
                let wait = self.window - elapsed;
                warn!(
                    calls = window.call_count,
                    wait_ms = wait.as_millis() as u64,
                    "Call budget exhausted, sleeping out the window"
                );
                tokio::time::sleep(wait).await;
                window.reset(Instant::now());
            }
        } else {
            debug!(calls = window.call_count, "Rate window elapsed, resetting");
            window.reset(Instant::now());
        }

        if let Some(deadline) = window.rolling_deadline(self.calls_per_window, self.window) {
            let now = Instant::now();
            if deadline > now {
                warn!(
                    wait_ms = (deadline - now).as_millis() as u64,
                    "Rolling budget exhausted, waiting for the oldest call to age out"
                );
                tokio::time::sleep_until(deadline).await;
            }
        }

        WindowPermit {
            window,
            budget: self.calls_per_window as usize,
        }
    }

    /// Live calls recorded in the current window
    pub async fn call_count(&self) -> u32 {
        self.state.lock().await.call_count
    }

    /// Configured budget per window
    pub fn calls_per_window(&self) -> u32 {
        self.calls_per_window
    }

    /// Configured window length
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimiterConfig::default())
    }
}

/// Exclusive access to the rate window for one live call
#[derive(Debug)]
pub struct WindowPermit<'a> {
    window: MutexGuard<'a, RateWindow>,
    budget: usize,
}

impl WindowPermit<'_> {
    /// Count the live call that was just issued; returns the window's count
    pub fn record_call(mut self) -> u32 {
        let now = Instant::now();
        self.window.recent.push_back(now);
        while self.window.recent.len() > self.budget {
            self.window.recent.pop_front();
        }
        self.window.call_count += 1;
        self.window.call_count
    }
}
