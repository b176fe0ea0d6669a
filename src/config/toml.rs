//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Endpoint candidates, in configured order
    #[serde(default)]
    pub endpoints: Vec<EndpointSection>,

    /// Build configuration section
    #[serde(default)]
    pub build: BuildSection,

    /// Polling configuration section
    #[serde(default)]
    pub polling: PollingSection,

    /// Correlation configuration section
    #[serde(default)]
    pub correlation: CorrelationSection,

    /// Transcript configuration section
    #[serde(default)]
    pub transcript: TranscriptSection,
}

/// One `[[endpoints]]` entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointSection {
    /// Endpoint URL
    pub url: String,

    /// "production", "development" or "local"; inferred from the host when absent
    pub environment: Option<String>,

    /// Per-attempt timeout in milliseconds
    pub timeout_ms: Option<u64>,

    /// Failures after which the endpoint is skipped
    pub max_retries: Option<u32>,

    /// "path" or "query"; inferred from the URL when absent
    pub dialect: Option<String>,
}

/// Build configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// "production" or "development"
    pub profile: Option<String>,
}

/// Polling configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollingSection {
    /// Delay before the first poll in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Interval between polls in milliseconds
    pub interval_ms: Option<u64>,

    /// Number of poll attempts
    pub max_attempts: Option<u32>,
}

/// Correlation configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrelationSection {
    /// "reject" or "replace"
    pub policy: Option<String>,

    /// Age in seconds after which abandoned callbacks are swept
    pub ttl_secs: Option<u64>,
}

/// Transcript configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptSection {
    /// JSON-lines file receiving every processed response
    pub path: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# Automation Relay Configuration File

# Endpoint candidates. Tried in priority order for the build profile;
# endpoints of the same environment keep the order given here.
# With no endpoints, http://localhost:5678/webhook is used.
# Note: --endpoint on the command line REPLACES this list entirely.

# [[endpoints]]
# url = "https://automation.example.com/webhook"
# environment = "production"   # production, development or local (default: from the host)
# timeout_ms = 10000           # per-attempt timeout (default: 10000)
# max_retries = 2              # failures before the endpoint is skipped (default: 2)
# dialect = "query"            # "path" or "query" (default: inferred from the host)

# [[endpoints]]
# url = "http://localhost:5678/webhook"
# environment = "local"

[build]
# Endpoint priority. "production": production, development, local.
# "development": development, local, production.
# Default: production for release binaries, development otherwise.
# profile = "production"

[polling]
# Delay before the first poll in milliseconds (default: 1000)
initial_delay_ms = 1000

# Interval between polls in milliseconds (default: 2000)
interval_ms = 2000

# Number of poll attempts before the fallback reply is used (default: 30)
max_attempts = 30

[correlation]
# What to do when a conversation already has a waiter: "reject" or "replace"
# policy = "reject"

# Drop waiters nobody resolved after this many seconds (default: never).
# Must be longer than the polling window.
# ttl_secs = 300

[transcript]
# Append every processed response to a JSON-lines file
# path = "responses.jsonl"
"#
    .to_string()
}
