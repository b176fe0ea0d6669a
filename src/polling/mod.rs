//! Time-spaced polling for one conversation at a time.
//!
//! This module provides:
//! - Scheduling of repeated poll attempts ([`PollingScheduler`])
//! - Control over a running poll ([`PollHandle`], [`PollOutcome`])
//! - Timing and budget settings ([`PollingSettings`])
//! - The locally synthesized timeout reply ([`FallbackResponse`])

mod fallback;
mod scheduler;
mod settings;


pub use fallback::FallbackResponse;
pub use scheduler::{PollHandle, PollOutcome, PollingScheduler};
pub use settings::PollingSettings;
