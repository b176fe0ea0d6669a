//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid endpoint URL provided.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The invalid URL string
        url: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid duration value (zero or inconsistent with another setting).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// A named value (environment, dialect, profile, policy) was not recognised.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

/// Well-known field names used in error messages.
pub mod field {
    /// An endpoint's URL.
    pub const ENDPOINT_URL: &str = "endpoints.url";
    /// An endpoint's environment tag.
    pub const ENDPOINT_ENVIRONMENT: &str = "endpoints.environment";
    /// An endpoint's poll dialect.
    pub const ENDPOINT_DIALECT: &str = "endpoints.dialect";
    /// An endpoint's per-attempt timeout.
    pub const ENDPOINT_TIMEOUT: &str = "endpoints.timeout_ms";
    /// The build profile.
    pub const PROFILE: &str = "build.profile";
    /// The poll interval.
    pub const POLL_INTERVAL: &str = "polling.interval_ms";
    /// The callback registration policy.
    pub const POLICY: &str = "correlation.policy";
    /// The callback TTL.
    pub const TTL: &str = "correlation.ttl_secs";
}

impl ConfigError {
    /// Creates an `InvalidValue` error.
    #[must_use]
    pub const fn invalid(field: &'static str, reason: String) -> Self {
        Self::InvalidValue { field, reason }
    }
}
