//! Outbound call rate limiting.
//!
//! Alpaca enforces both a short burst limit and a sustained per-minute limit
//! on REST calls. Both windows are owned by a single limiter shared by every
//! outbound operation: a quote fetch and an order submission draw from the
//! same counters. Admission checks the fast window first, then the slow one,
//! and records the call in both only when both have room. Rejected calls are
//! not charged to either window.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::errors::GatewayError;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub fast_capacity: u32,
    pub fast_period: Duration,
    pub slow_capacity: u32,
    pub slow_period: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            fast_capacity: 10,
            fast_period: Duration::from_secs(1),
            slow_capacity: 200,
            slow_period: Duration::from_secs(60),
        }
    }
}

/// Which sliding window rejected a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitWindow {
    Fast,
    Slow,
}

impl fmt::Display for LimitWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitWindow::Fast => write!(f, "fast"),
            LimitWindow::Slow => write!(f, "slow"),
        }
    }
}

/// One sliding window: timestamps of recently admitted calls.
#[derive(Debug)]
struct Window {
    capacity: usize,
    period: Duration,
    hits: VecDeque<Instant>,
}

impl Window {
    fn new(capacity: u32, period: Duration) -> Self {
        Self {
            capacity: capacity as usize,
            period,
            hits: VecDeque::new(),
        }
    }

    /// Drop hits that have aged out of the trailing period.
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.hits.front() {
            if now.duration_since(*oldest) >= self.period {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }

    fn record(&mut self, now: Instant) {
        self.hits.push_back(now);
    }

    /// Time until the oldest hit leaves the window and frees a slot.
    fn retry_after(&self, now: Instant) -> Duration {
        self.hits
            .front()
            .map(|oldest| (*oldest + self.period).saturating_duration_since(now))
            .unwrap_or_default()
    }
}

/// Shared limiter owning both windows.
///
/// Both windows live behind one mutex so that "check fast, check slow,
/// record in both" is atomic across concurrent callers: two racing calls
/// cannot both observe the last free slot.
#[derive(Debug)]
pub struct CallRateLimiter {
    windows: Mutex<(Window, Window)>,
}

impl CallRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            windows: Mutex::new((
                Window::new(config.fast_capacity, config.fast_period),
                Window::new(config.slow_capacity, config.slow_period),
            )),
        }
    }

    /// Admit one outbound call for `operation`, or reject it naming the
    /// exhausted window. Rejections consume no slot in either window.
    pub fn admit(&self, operation: &str) -> Result<(), GatewayError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");
        let (fast, slow) = &mut *windows;

        fast.prune(now);
        slow.prune(now);

        if fast.is_full() {
            tracing::warn!("Rate limit hit for {}: fast window exhausted", operation);
            return Err(rejection(operation, LimitWindow::Fast, fast.retry_after(now)));
        }
        if slow.is_full() {
            tracing::warn!("Rate limit hit for {}: slow window exhausted", operation);
            return Err(rejection(operation, LimitWindow::Slow, slow.retry_after(now)));
        }

        fast.record(now);
        slow.record(now);
        Ok(())
    }

    #[cfg(test)]
    fn depths(&self) -> (usize, usize) {
        let windows = self.windows.lock().expect("rate limiter lock poisoned");
        (windows.0.hits.len(), windows.1.hits.len())
    }
}

impl Default for CallRateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}

fn rejection(operation: &str, window: LimitWindow, retry_after: Duration) -> GatewayError {
    GatewayError::RateLimited {
        operation: operation.to_string(),
        window,
        retry_after_ms: retry_after.as_millis() as u64,
    }
}
