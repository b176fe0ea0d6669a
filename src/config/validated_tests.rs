//! Tests for validated configuration.

use std::time::Duration;

use super::ConfigError;
use super::cli::Cli;
use super::toml::TomlConfig;
use super::validated::{ValidatedConfig, write_default_config};
use crate::correlation::RegistrationPolicy;
use crate::endpoint::{BuildProfile, EndpointConfig, EnvironmentTag, PollDialect};

/// Helper to create CLI args for the poll command
fn cli(args: &[&str]) -> Cli {
    let mut full_args = vec!["automation-relay"];
    full_args.extend(args);
    full_args.extend(["poll", "c1"]);
    Cli::parse_from_iter(full_args)
}

/// Helper to parse TOML config
fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

fn hosts(endpoints: &[EndpointConfig]) -> Vec<&str> {
    endpoints
        .iter()
        .map(|e| e.url().host_str().unwrap_or_default())
        .collect()
}

const THREE_ENDPOINTS: &str = r#"
    [[endpoints]]
    url = "http://localhost:5678/webhook"
    environment = "local"

    [[endpoints]]
    url = "https://prod.example.com/webhook"
    environment = "production"

    [[endpoints]]
    url = "https://dev.example.com/webhook"
    environment = "development"
"#;

mod endpoints {
    use super::*;

    #[test]
    fn production_profile_orders_production_first() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--profile", "production"]),
            Some(&toml(THREE_ENDPOINTS)),
        )
        .unwrap();

        assert_eq!(
            hosts(&config.endpoints),
            vec!["prod.example.com", "dev.example.com", "localhost"]
        );
    }

    #[test]
    fn development_profile_orders_development_first() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--profile", "development"]),
            Some(&toml(THREE_ENDPOINTS)),
        )
        .unwrap();

        assert_eq!(
            hosts(&config.endpoints),
            vec!["dev.example.com", "localhost", "prod.example.com"]
        );
    }

    #[test]
    fn endpoint_fields_and_defaults() {
        let config = ValidatedConfig::from_raw(
            &cli(&[]),
            Some(&toml(
                r#"
                [[endpoints]]
                url = "https://prod.example.com/webhook"
                environment = "production"
                timeout_ms = 2500
                max_retries = 4

                [[endpoints]]
                url = "http://localhost:5678/webhook"
            "#,
            )),
        )
        .unwrap();

        let prod = config
            .endpoints
            .iter()
            .find(|e| e.environment() == EnvironmentTag::Production)
            .unwrap();
        assert_eq!(prod.timeout(), Duration::from_millis(2500));
        assert_eq!(prod.max_retries(), 4);
        assert_eq!(prod.dialect(), PollDialect::QueryParam);

        let local = config
            .endpoints
            .iter()
            .find(|e| e.environment() == EnvironmentTag::Local)
            .unwrap();
        assert_eq!(local.timeout(), EndpointConfig::DEFAULT_TIMEOUT);
        assert_eq!(local.max_retries(), EndpointConfig::DEFAULT_MAX_RETRIES);
        assert_eq!(local.dialect(), PollDialect::PathParam);
    }

    #[test]
    fn explicit_dialect_overrides_inference() {
        let config = ValidatedConfig::from_raw(
            &cli(&[]),
            Some(&toml(
                r#"
                [[endpoints]]
                url = "https://tunnel.example.com/webhook"
                environment = "development"
                dialect = "path"
            "#,
            )),
        )
        .unwrap();

        assert_eq!(config.endpoints[0].dialect(), PollDialect::PathParam);
    }

    #[test]
    fn cli_endpoints_parse_environment_prefix() {
        let config = ValidatedConfig::from_raw(
            &cli(&[
                "--profile",
                "development",
                "--endpoint",
                "prod=https://prod.example.com/webhook",
                "--endpoint",
                "dev=https://dev.example.com/webhook?key=abc",
                "--endpoint",
                "http://127.0.0.1:5678/webhook",
            ]),
            None,
        )
        .unwrap();

        let tags: Vec<_> = config.endpoints.iter().map(EndpointConfig::environment).collect();
        assert_eq!(
            tags,
            vec![
                EnvironmentTag::Development,
                EnvironmentTag::Local,
                EnvironmentTag::Production
            ]
        );
        assert_eq!(
            config.endpoints[0].url().as_str(),
            "https://dev.example.com/webhook?key=abc"
        );
    }

    #[test]
    fn cli_endpoint_without_prefix_infers_environment() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--endpoint", "https://hooks.example.com/x?token=a=b"]),
            None,
        )
        .unwrap();

        assert_eq!(config.endpoints[0].environment(), EnvironmentTag::Production);
        assert_eq!(config.endpoints[0].url().query(), Some("token=a=b"));
    }

    #[test]
    fn no_endpoints_is_valid() {
        let config = ValidatedConfig::from_raw(&cli(&[]), None).unwrap();
        assert!(config.endpoints.is_empty());
    }
}

mod precedence {
    use super::*;

    #[test]
    fn cli_endpoints_replace_toml_endpoints() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--endpoint", "dev=https://cli.example.com/webhook"]),
            Some(&toml(THREE_ENDPOINTS)),
        )
        .unwrap();

        assert_eq!(hosts(&config.endpoints), vec!["cli.example.com"]);
    }

    #[test]
    fn cli_polling_overrides_toml() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--poll-interval-ms", "300"]),
            Some(&toml(
                r"
                [polling]
                initial_delay_ms = 50
                interval_ms = 900
                max_attempts = 4
            ",
            )),
        )
        .unwrap();

        assert_eq!(config.polling.interval, Duration::from_millis(300));
        assert_eq!(config.polling.initial_delay, Duration::from_millis(50));
        assert_eq!(config.polling.max_attempts, 4);
    }

    #[test]
    fn defaults_fill_the_rest() {
        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml(""))).unwrap();

        assert_eq!(config.polling.initial_delay, Duration::from_secs(1));
        assert_eq!(config.polling.interval, Duration::from_secs(2));
        assert_eq!(config.polling.max_attempts, 30);
        assert_eq!(config.policy, RegistrationPolicy::Reject);
        assert_eq!(config.profile, BuildProfile::current());
        assert!(config.callback_ttl.is_none());
        assert!(config.transcript.is_none());
    }

    #[test]
    fn cli_profile_and_policy_override_toml() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--profile", "dev", "--policy", "reject"]),
            Some(&toml(
                r#"
                [build]
                profile = "production"

                [correlation]
                policy = "replace"
            "#,
            )),
        )
        .unwrap();

        assert_eq!(config.profile, BuildProfile::Development);
        assert_eq!(config.policy, RegistrationPolicy::Reject);
    }

    #[test]
    fn toml_profile_and_policy_used_without_cli() {
        let config = ValidatedConfig::from_raw(
            &cli(&[]),
            Some(&toml(
                r#"
                [build]
                profile = "release"

                [correlation]
                policy = "replace"
                ttl_secs = 600

                [transcript]
                path = "toml.jsonl"
            "#,
            )),
        )
        .unwrap();

        assert_eq!(config.profile, BuildProfile::Production);
        assert_eq!(config.policy, RegistrationPolicy::Replace);
        assert_eq!(config.callback_ttl, Some(Duration::from_secs(600)));
        assert_eq!(
            config.transcript.as_deref().and_then(|p| p.to_str()),
            Some("toml.jsonl")
        );
    }

    #[test]
    fn cli_transcript_overrides_toml() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--transcript", "cli.jsonl"]),
            Some(&toml(
                r#"
                [transcript]
                path = "toml.jsonl"
            "#,
            )),
        )
        .unwrap();

        assert_eq!(
            config.transcript.as_deref().and_then(|p| p.to_str()),
            Some("cli.jsonl")
        );
    }
}

mod validation {
    use super::*;

    fn error_for(args: &[&str], content: &str) -> ConfigError {
        ValidatedConfig::from_raw(&cli(args), Some(&toml(content))).unwrap_err()
    }

    #[test]
    fn malformed_url_is_rejected() {
        let err = error_for(&["--endpoint", "not a url"], "");
        assert!(matches!(err, ConfigError::InvalidUrl { url, .. } if url == "not a url"));
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let err = error_for(
            &[],
            r#"
            [[endpoints]]
            url = "ftp://files.example.com/drop"
        "#,
        );
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = error_for(&["--endpoint", "qa=https://qa.example.com"], "");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "endpoints.environment",
                ..
            }
        ));
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let err = error_for(
            &[],
            r#"
            [[endpoints]]
            url = "https://prod.example.com"
            dialect = "graphql"
        "#,
        );
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "endpoints.dialect",
                ..
            }
        ));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = error_for(
            &[],
            r#"
            [correlation]
            policy = "merge"
        "#,
        );
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "correlation.policy",
                ..
            }
        ));
    }

    #[test]
    fn unknown_toml_profile_is_rejected() {
        let err = error_for(
            &[],
            r#"
            [build]
            profile = "canary"
        "#,
        );
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "build.profile",
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = error_for(
            &[],
            r#"
            [[endpoints]]
            url = "https://prod.example.com"
            timeout_ms = 0
        "#,
        );
        assert!(matches!(
            err,
            ConfigError::InvalidDuration {
                field: "endpoints.timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = error_for(&["--poll-interval-ms", "0"], "");
        assert!(matches!(
            err,
            ConfigError::InvalidDuration {
                field: "polling.interval_ms",
                ..
            }
        ));
    }

    #[test]
    fn ttl_inside_polling_window_is_rejected() {
        // window = 1s + 29 * 2s = 59s
        let err = error_for(
            &[],
            r"
            [correlation]
            ttl_secs = 59
        ",
        );
        assert!(matches!(
            err,
            ConfigError::InvalidDuration {
                field: "correlation.ttl_secs",
                ..
            }
        ));
    }

    #[test]
    fn ttl_beyond_polling_window_is_accepted() {
        let config = ValidatedConfig::from_raw(
            &cli(&[]),
            Some(&toml(
                r"
                [correlation]
                ttl_secs = 60
            ",
            )),
        )
        .unwrap();

        assert_eq!(config.callback_ttl, Some(Duration::from_secs(60)));
    }
}

mod loading {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn load_reads_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{THREE_ENDPOINTS}").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = ValidatedConfig::load(&cli(&["--config", &path])).unwrap();

        assert_eq!(config.endpoints.len(), 3);
    }

    #[test]
    fn load_without_config_file_uses_defaults() {
        let config = ValidatedConfig::load(&cli(&[])).unwrap();

        assert!(config.endpoints.is_empty());
        assert_eq!(config.polling.max_attempts, 30);
    }

    #[test]
    fn load_missing_file_fails() {
        let err =
            ValidatedConfig::load(&cli(&["--config", "/nonexistent/relay.toml"])).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn written_template_loads_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relay.toml");

        write_default_config(&path).unwrap();
        let config =
            ValidatedConfig::load(&cli(&["--config", path.to_str().unwrap()])).unwrap();

        assert!(config.endpoints.is_empty());
        assert_eq!(config.policy, RegistrationPolicy::Reject);
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("relay.toml");

        let err = write_default_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::FileWrite { .. }));
    }

    #[test]
    fn display_summarizes_config() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--profile", "production"]),
            Some(&toml(THREE_ENDPOINTS)),
        )
        .unwrap();

        let summary = config.to_string();
        assert!(summary.contains("endpoints: 3"));
        assert!(summary.contains("profile: production"));
        assert!(summary.contains("transcript: none"));
    }
}
