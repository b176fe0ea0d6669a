//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::correlation::RegistrationPolicy;
use crate::endpoint::BuildProfile;

/// Automation relay: deliver events to an automation backend and wait for its reply.
///
/// Sends JSON payloads to the first healthy endpoint candidate and polls
/// for conversation results with failover and circuit-breaking.
#[derive(Debug, Parser)]
#[command(name = "automation-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Endpoint candidate as 'URL' or 'ENV=URL' (can be specified multiple times)
    #[arg(long = "endpoint", value_name = "[ENV=]URL", global = true)]
    pub endpoints: Vec<String>,

    /// Build profile deciding endpoint priority (default: from the binary)
    #[arg(long, value_enum, global = true)]
    pub profile: Option<ProfileArg>,

    /// Delay before the first poll in milliseconds
    #[arg(long = "initial-delay-ms", global = true)]
    pub initial_delay_ms: Option<u64>,

    /// Interval between polls in milliseconds
    #[arg(long = "poll-interval-ms", global = true)]
    pub poll_interval_ms: Option<u64>,

    /// What to do when a conversation is already being waited on
    #[arg(long, value_enum, global = true)]
    pub policy: Option<PolicyArg>,

    /// Append every processed response to this JSON-lines file
    #[arg(long, global = true)]
    pub transcript: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for automation-relay
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "automation-relay.toml")]
        output: PathBuf,
    },

    /// Deliver one JSON payload to the first healthy endpoint
    Send {
        /// JSON payload to deliver
        #[arg(long)]
        payload: String,
    },

    /// Poll for a conversation's result until it arrives or attempts run out
    Poll {
        /// Conversation to poll for
        conversation_id: String,

        /// Number of poll attempts (overrides the configured value)
        #[arg(long = "max-attempts")]
        max_attempts: Option<u32>,
    },
}

/// Build profile argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    /// Production endpoints first
    #[value(name = "production", alias = "prod")]
    Production,
    /// Development endpoints first
    #[value(name = "development", alias = "dev")]
    Development,
}

impl From<ProfileArg> for BuildProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Production => Self::Production,
            ProfileArg::Development => Self::Development,
        }
    }
}

/// Registration policy argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Refuse a second waiter for the same conversation
    Reject,
    /// Replace the earlier waiter
    Replace,
}

impl From<PolicyArg> for RegistrationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Reject => Self::Reject,
            PolicyArg::Replace => Self::Replace,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Parses CLI arguments from an iterator, returning clap's error instead of exiting.
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }
}
