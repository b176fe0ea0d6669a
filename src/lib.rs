//! Automation relay: resilient delivery and response correlation for
//! external automation webhooks.
//!
//! Outbound events go to the first healthy endpoint of a prioritized list
//! with bounded failover and per-endpoint circuit-breaking. Results come
//! back by polling, by in-process events, or through a shared key-value
//! store, and are routed to exactly one waiting callback per conversation.
//!
//! The [`service::WebhookService`] facade ties the pieces together.

pub mod config;
pub mod correlation;
pub mod delivery;
pub mod endpoint;
pub mod inbound;
pub mod polling;
pub mod service;
pub mod time;
pub mod transport;
