//! Polling timing configuration.

use std::time::Duration;

/// Timing and budget for one polling run.
///
/// # Defaults
///
/// - `initial_delay`: 1 second
/// - `interval`: 2 seconds
/// - `max_attempts`: 30
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingSettings {
    /// Wait before the first attempt.
    pub initial_delay: Duration,
    /// Wait between attempts.
    pub interval: Duration,
    /// Attempts before giving up. At least one attempt is always made.
    pub max_attempts: u32,
}

impl PollingSettings {
    /// Default initial delay (1 second).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

    /// Default interval (2 seconds).
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

    /// Default attempt budget.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

    /// Creates settings with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            interval: Self::DEFAULT_INTERVAL,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the interval between attempts.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the attempt budget.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Longest time a run can take before timing out, ignoring request time.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.initial_delay + self.interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self::new()
    }
}
