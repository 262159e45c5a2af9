//! Wait mechanisms.
//!
//! Polling waits used by every `find`/`eliminate` operation. A wait retries
//! its callback until it succeeds or the timeout elapses; on timeout the
//! callback's last error is surfaced unchanged so callers see the real
//! reason ("Unable to find an element ...") instead of a bare timeout.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::result::{WiringError, WiringResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (1 second)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 1_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Environment variable overriding the wait timeout
pub const TIMEOUT_ENV: &str = "TESTWIRE_TIMEOUT_MS";

/// Environment variable overriding the polling interval
pub const POLL_INTERVAL_ENV: &str = "TESTWIRE_POLL_INTERVAL_MS";

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overridden by `TESTWIRE_TIMEOUT_MS` / `TESTWIRE_POLL_INTERVAL_MS`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(ms) = lookup(TIMEOUT_ENV).and_then(|v| v.trim().parse().ok()) {
            options.timeout_ms = ms;
        }
        if let Some(ms) = lookup(POLL_INTERVAL_ENV).and_then(|v| v.trim().parse().ok()) {
            options.poll_interval_ms = ms;
        }
        options
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAITING
// =============================================================================

/// Retry `attempt` until it returns `Ok` or the timeout elapses.
///
/// The callback always runs at least once, and once more right at the
/// deadline. On timeout the last error is returned.
pub async fn wait_for<T, F>(options: &WaitOptions, mut attempt: F) -> WiringResult<T>
where
    F: FnMut() -> WiringResult<T>,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut polls = 0_u32;

    loop {
        polls += 1;
        match attempt() {
            Ok(value) => {
                tracing::trace!(polls, elapsed_ms = ?start.elapsed(), "wait condition met");
                return Ok(value);
            }
            Err(err) => {
                let now = Instant::now();
                if now >= deadline {
                    tracing::debug!(polls, timeout_ms = options.timeout_ms, error = %err, "wait timed out");
                    return Err(err);
                }
                let remaining = deadline - now;
                tokio::time::sleep(options.poll_interval().min(remaining)).await;
            }
        }
    }
}

/// Wait until `predicate` holds, failing with [`WiringError::Timeout`]
pub async fn wait_until<F>(
    options: &WaitOptions,
    description: &str,
    mut predicate: F,
) -> WiringResult<()>
where
    F: FnMut() -> bool,
{
    wait_for(options, || {
        if predicate() {
            Ok(())
        } else {
            Err(WiringError::Timeout {
                ms: options.timeout_ms,
                description: description.to_string(),
            })
        }
    })
    .await
}

/// Wait for a fixed duration (discouraged - use wait conditions instead)
pub async fn wait_timeout(duration_ms: u64) {
    tokio::time::sleep(Duration::from_millis(duration_ms)).await;
}

// =============================================================================
// TESTS
// =============================================================================
