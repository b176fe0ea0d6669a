//! Error types for correlation and persistence.

use thiserror::Error;

/// Error type for callback registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorrelationError {
    /// A waiter is already registered for this conversation and the
    /// registration policy forbids replacing it.
    #[error("A callback is already pending for conversation '{conversation_id}'")]
    AlreadyPending {
        /// The conversation with the existing waiter
        conversation_id: String,
    },
}

/// Error type for response persistence.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to write the record.
    #[error("Failed to write response record: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the record.
    #[error("Failed to serialize response record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backing store refused the record.
    #[error("Response record rejected: {0}")]
    Rejected(String),
}
