//! Error types for delivery and poll operations.

use thiserror::Error;

use crate::transport::HttpError;

/// Why a single attempt against one endpoint failed.
///
/// Every variant counts as a failure for circuit-breaking.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The request never produced a response (network error or timeout).
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}{}", .body.as_ref().map(|b| format!(": {b}")).unwrap_or_default())]
    NonSuccessStatus {
        /// The HTTP status code returned
        status: http::StatusCode,
        /// Response body (if available and valid UTF-8)
        body: Option<String>,
    },
}

impl AttemptError {
    /// Returns true if the attempt was cancelled by its timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(HttpError::Timeout))
    }
}

/// Error type for a whole send operation.
///
/// Returned as a value; the send path never panics or aborts the caller.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Every candidate was tried or skipped without a successful attempt.
    #[error("All endpoint candidates failed after {attempts} attempt(s){}", .last_error.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    Exhausted {
        /// Loop iterations used, skips included
        attempts: u32,
        /// Error from the last real attempt; `None` if every candidate was skipped
        last_error: Option<AttemptError>,
    },

    /// The payload could not be encoded as JSON; no attempt was made.
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl DeliveryError {
    /// Loop iterations used before giving up (zero for serialization failures).
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Serialize(_) => 0,
        }
    }
}
