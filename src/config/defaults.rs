//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

use crate::endpoint::EndpointConfig;
use crate::polling::PollingSettings;

/// Default per-attempt timeout in milliseconds.
#[allow(clippy::cast_possible_truncation)]
pub const ENDPOINT_TIMEOUT_MS: u64 = EndpointConfig::DEFAULT_TIMEOUT.as_millis() as u64;

/// Default failure threshold before an endpoint is skipped.
pub const ENDPOINT_MAX_RETRIES: u32 = EndpointConfig::DEFAULT_MAX_RETRIES;

/// Default delay before the first poll in milliseconds.
#[allow(clippy::cast_possible_truncation)]
pub const POLL_INITIAL_DELAY_MS: u64 = PollingSettings::DEFAULT_INITIAL_DELAY.as_millis() as u64;

/// Default interval between polls in milliseconds.
#[allow(clippy::cast_possible_truncation)]
pub const POLL_INTERVAL_MS: u64 = PollingSettings::DEFAULT_INTERVAL.as_millis() as u64;

/// Default number of poll attempts.
pub const POLL_MAX_ATTEMPTS: u32 = PollingSettings::DEFAULT_MAX_ATTEMPTS;

/// Default interval between sweeps of abandoned callbacks, in seconds.
pub const SWEEP_INTERVAL_SECS: u64 = 30;

/// Default per-attempt timeout as Duration.
#[must_use]
pub const fn endpoint_timeout() -> Duration {
    Duration::from_millis(ENDPOINT_TIMEOUT_MS)
}

/// Default sweep interval as Duration.
#[must_use]
pub const fn sweep_interval() -> Duration {
    Duration::from_secs(SWEEP_INTERVAL_SECS)
}
