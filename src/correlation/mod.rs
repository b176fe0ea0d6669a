//! Response correlation.
//!
//! This module provides:
//! - The response shape shared by every transport ([`WebhookResponse`])
//! - The per-conversation waiter map ([`PendingCallbacks`], [`Registration`])
//! - Persistence of processed responses ([`ResponseSink`], [`NoopSink`], [`JsonLinesSink`])
//! - Resolution of incoming responses to waiters ([`ResponseCorrelator`])

mod callbacks;
mod correlator;
mod error;
mod response;
mod sink;


pub use callbacks::{PendingCallbacks, Registration, RegistrationPolicy, ResponseCallback};
pub use correlator::{Resolution, ResponseCorrelator};
pub use error::{CorrelationError, SinkError};
pub use response::{ResponseSource, WebhookResponse};
pub use sink::{JsonLinesSink, NoopSink, ResponseMetadata, ResponseSink};
