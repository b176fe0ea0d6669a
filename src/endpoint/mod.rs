//! Endpoint candidates and failure bookkeeping.
//!
//! This module provides:
//! - Immutable endpoint descriptions ([`EndpointConfig`], [`EnvironmentTag`], [`PollDialect`])
//! - Deployment-priority ordering ([`BuildProfile`], [`order_by_priority`])
//! - The shared cursor and per-endpoint failure counters ([`EndpointRegistry`])

mod config;
mod registry;


pub use config::{BuildProfile, EndpointConfig, EnvironmentTag, PollDialect, order_by_priority};
pub use registry::EndpointRegistry;
