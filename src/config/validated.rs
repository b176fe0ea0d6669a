//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::correlation::RegistrationPolicy;
use crate::endpoint::{
    BuildProfile, EndpointConfig, EnvironmentTag, PollDialect, order_by_priority,
};
use crate::polling::PollingSettings;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::{EndpointSection, TomlConfig};

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Endpoint candidates, ordered by priority for `profile`
    pub endpoints: Vec<EndpointConfig>,

    /// Build profile used for ordering
    pub profile: BuildProfile,

    /// Polling timing and budget
    pub polling: PollingSettings,

    /// Duplicate registration handling
    pub policy: RegistrationPolicy,

    /// Age after which abandoned callbacks are swept; `None` disables sweeping
    pub callback_ttl: Option<Duration>,

    /// JSON-lines file receiving processed responses; `None` disables it
    pub transcript: Option<PathBuf>,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transcript_str = self
            .transcript
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());
        let ttl_str = self
            .callback_ttl
            .map_or_else(|| "none".to_string(), |t| format!("{}s", t.as_secs()));

        write!(
            f,
            "Config {{ endpoints: {}, profile: {}, polling: {}ms+{}x{}ms, policy: {:?}, \
             ttl: {}, transcript: {} }}",
            self.endpoints.len(),
            self.profile,
            self.polling.initial_delay.as_millis(),
            self.polling.max_attempts,
            self.polling.interval.as_millis(),
            self.policy,
            ttl_str,
            transcript_str,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An endpoint URL is invalid or not http(s)
    /// - An environment, dialect, profile or policy name is unknown
    /// - A timeout or poll interval is zero
    /// - The callback TTL does not exceed the polling window
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let profile = Self::resolve_profile(cli, toml)?;

        let endpoints = order_by_priority(Self::resolve_endpoints(cli, toml)?, profile);

        let polling = Self::resolve_polling(cli, toml)?;

        let policy = Self::resolve_policy(cli, toml)?;

        let callback_ttl = Self::resolve_ttl(toml, &polling)?;

        // CLI takes precedence
        let transcript = cli.transcript.clone().or_else(|| {
            toml.and_then(|t| t.transcript.path.as_ref().map(PathBuf::from))
        });

        Ok(Self {
            endpoints,
            profile,
            polling,
            policy,
            callback_ttl,
            transcript,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_profile(cli: &Cli, toml: Option<&TomlConfig>) -> Result<BuildProfile, ConfigError> {
        if let Some(profile) = cli.profile {
            return Ok(profile.into());
        }

        toml.and_then(|t| t.build.profile.as_deref())
            .map_or(Ok(BuildProfile::current()), |s| {
                s.parse()
                    .map_err(|reason| ConfigError::invalid(field::PROFILE, reason))
            })
    }

    fn resolve_endpoints(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Vec<EndpointConfig>, ConfigError> {
        // CLI endpoints replace TOML endpoints entirely
        if !cli.endpoints.is_empty() {
            return cli
                .endpoints
                .iter()
                .map(String::as_str)
                .map(parse_cli_endpoint)
                .collect();
        }

        toml.map_or_else(
            || Ok(Vec::new()),
            |t| t.endpoints.iter().map(build_endpoint).collect(),
        )
    }

    fn resolve_polling(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<PollingSettings, ConfigError> {
        let polling = toml.map(|t| &t.polling);

        // Priority: CLI explicit > TOML > default
        let initial_delay_ms = cli
            .initial_delay_ms
            .or_else(|| polling.and_then(|p| p.initial_delay_ms))
            .unwrap_or(defaults::POLL_INITIAL_DELAY_MS);

        let interval_ms = cli
            .poll_interval_ms
            .or_else(|| polling.and_then(|p| p.interval_ms))
            .unwrap_or(defaults::POLL_INTERVAL_MS);

        let max_attempts = polling
            .and_then(|p| p.max_attempts)
            .unwrap_or(defaults::POLL_MAX_ATTEMPTS);

        if interval_ms == 0 {
            return Err(ConfigError::InvalidDuration {
                field: field::POLL_INTERVAL,
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(PollingSettings::new()
            .with_initial_delay(Duration::from_millis(initial_delay_ms))
            .with_interval(Duration::from_millis(interval_ms))
            .with_max_attempts(max_attempts))
    }

    fn resolve_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RegistrationPolicy, ConfigError> {
        if let Some(policy) = cli.policy {
            return Ok(policy.into());
        }

        toml.and_then(|t| t.correlation.policy.as_deref())
            .map_or(Ok(RegistrationPolicy::default()), |s| {
                s.parse()
                    .map_err(|reason| ConfigError::invalid(field::POLICY, reason))
            })
    }

    fn resolve_ttl(
        toml: Option<&TomlConfig>,
        polling: &PollingSettings,
    ) -> Result<Option<Duration>, ConfigError> {
        let Some(secs) = toml.and_then(|t| t.correlation.ttl_secs) else {
            return Ok(None);
        };

        let ttl = Duration::from_secs(secs);
        let window = polling.window();
        if ttl <= window {
            return Err(ConfigError::InvalidDuration {
                field: field::TTL,
                reason: format!(
                    "{secs}s must exceed the polling window ({}s)",
                    window.as_secs_f64()
                ),
            });
        }

        Ok(Some(ttl))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn parse_url(s: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(s).map_err(|e| ConfigError::InvalidUrl {
        url: s.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: s.to_string(),
            reason: format!("unsupported scheme '{}': expected http or https", url.scheme()),
        });
    }

    Ok(url)
}

/// Environment for an endpoint that does not state one.
fn infer_environment(url: &Url) -> EnvironmentTag {
    match PollDialect::infer(url) {
        PollDialect::PathParam => EnvironmentTag::Local,
        PollDialect::QueryParam => EnvironmentTag::Production,
    }
}

fn parse_environment(s: &str) -> Result<EnvironmentTag, ConfigError> {
    s.parse()
        .map_err(|reason| ConfigError::invalid(field::ENDPOINT_ENVIRONMENT, reason))
}

/// Parses `--endpoint` values of the form `URL` or `ENV=URL`.
fn parse_cli_endpoint(s: &str) -> Result<EndpointConfig, ConfigError> {
    let (environment, url_str) = match s.split_once('=') {
        // '=' inside a query string is not an environment prefix
        Some((env, url)) if !env.contains(':') => (Some(env.trim()), url.trim()),
        _ => (None, s.trim()),
    };

    let url = parse_url(url_str)?;
    let environment = match environment {
        Some(env) => parse_environment(env)?,
        None => infer_environment(&url),
    };

    Ok(EndpointConfig::new(url, environment))
}

fn build_endpoint(section: &EndpointSection) -> Result<EndpointConfig, ConfigError> {
    let url = parse_url(&section.url)?;

    let environment = match section.environment.as_deref() {
        Some(env) => parse_environment(env)?,
        None => infer_environment(&url),
    };

    let timeout_ms = section.timeout_ms.unwrap_or(defaults::ENDPOINT_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(ConfigError::InvalidDuration {
            field: field::ENDPOINT_TIMEOUT,
            reason: format!("must be greater than 0 (endpoint {url})"),
        });
    }

    let mut endpoint = EndpointConfig::new(url, environment)
        .with_timeout(Duration::from_millis(timeout_ms))
        .with_max_retries(section.max_retries.unwrap_or(defaults::ENDPOINT_MAX_RETRIES));

    if let Some(ref dialect) = section.dialect {
        let dialect: PollDialect = dialect
            .parse()
            .map_err(|reason| ConfigError::invalid(field::ENDPOINT_DIALECT, reason))?;
        endpoint = endpoint.with_dialect(dialect);
    }

    Ok(endpoint)
}
