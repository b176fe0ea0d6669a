//! Bounded failover over endpoint candidates.
//!
//! This module provides:
//! - The outbound send path ([`DeliveryAttemptController`], [`Delivery`])
//! - The inbound poll path ([`PollResponseController`], [`ResponsePoller`])
//! - Per-attempt and per-operation errors ([`AttemptError`], [`DeliveryError`])
//!
//! Both paths walk the shared [`EndpointRegistry`](crate::endpoint::EndpointRegistry)
//! strictly sequentially: one attempt in flight at a time, at most one
//! iteration per candidate, skipped candidates included.

mod error;
mod failover;
mod poller;
mod sender;

#[cfg(test)]
pub(crate) mod test_fixtures;

#[cfg(test)]
mod poller_tests;

pub use error::{AttemptError, DeliveryError};
pub use poller::{PollResponseController, ResponsePoller};
pub use sender::{Delivery, DeliveryAttemptController};
