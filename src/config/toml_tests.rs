//! Tests for TOML configuration parsing.

use super::toml::{TomlConfig, default_config_template};

mod parsing {
    use super::*;

    #[test]
    fn parse_endpoint_list_in_order() {
        let toml = r#"
            [[endpoints]]
            url = "https://automation.example.com/webhook"
            environment = "production"
            timeout_ms = 5000
            max_retries = 3

            [[endpoints]]
            url = "http://localhost:5678/webhook"
            environment = "local"
            dialect = "path"
        "#;

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.endpoints.len(), 2);
        let first = &config.endpoints[0];
        assert_eq!(first.url, "https://automation.example.com/webhook");
        assert_eq!(first.environment.as_deref(), Some("production"));
        assert_eq!(first.timeout_ms, Some(5000));
        assert_eq!(first.max_retries, Some(3));
        assert!(first.dialect.is_none());
        assert_eq!(config.endpoints[1].dialect.as_deref(), Some("path"));
    }

    #[test]
    fn parse_polling_and_correlation_sections() {
        let toml = r#"
            [build]
            profile = "production"

            [polling]
            initial_delay_ms = 250
            interval_ms = 750
            max_attempts = 10

            [correlation]
            policy = "replace"
            ttl_secs = 120

            [transcript]
            path = "responses.jsonl"
        "#;

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.build.profile.as_deref(), Some("production"));
        assert_eq!(config.polling.initial_delay_ms, Some(250));
        assert_eq!(config.polling.interval_ms, Some(750));
        assert_eq!(config.polling.max_attempts, Some(10));
        assert_eq!(config.correlation.policy.as_deref(), Some("replace"));
        assert_eq!(config.correlation.ttl_secs, Some(120));
        assert_eq!(config.transcript.path.as_deref(), Some("responses.jsonl"));
    }

    #[test]
    fn parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.endpoints.is_empty());
        assert!(config.build.profile.is_none());
        assert!(config.polling.max_attempts.is_none());
        assert!(config.correlation.ttl_secs.is_none());
        assert!(config.transcript.path.is_none());
    }

    #[test]
    fn endpoint_requires_url() {
        let toml = r#"
            [[endpoints]]
            environment = "production"
        "#;

        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let toml = r"
            [polling]
            interval_ms = 100
            jitter_ms = 5
        ";

        assert!(TomlConfig::parse(toml).is_err());
    }

    #[test]
    fn reject_unknown_sections() {
        let toml = r#"
            [unknown_section]
            key = "value"
        "#;

        assert!(TomlConfig::parse(toml).is_err());
    }
}

mod loading {
    use super::*;
    use super::super::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[polling]\nmax_attempts = 7").unwrap();

        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.polling.max_attempts, Some(7));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = TomlConfig::load(std::path::Path::new("/nonexistent/relay.toml")).unwrap_err();

        assert!(matches!(err, ConfigError::FileRead { .. }));
        assert!(err.to_string().contains("/nonexistent/relay.toml"));
    }
}

mod default_template {
    use super::*;

    #[test]
    fn template_is_valid_toml() {
        let template = default_config_template();
        let result = TomlConfig::parse(&template);
        assert!(
            result.is_ok(),
            "Template should be valid TOML: {:?}",
            result.err()
        );
    }

    #[test]
    fn template_values_match_defaults() {
        let config = TomlConfig::parse(&default_config_template()).unwrap();

        assert_eq!(
            config.polling.initial_delay_ms,
            Some(super::super::defaults::POLL_INITIAL_DELAY_MS)
        );
        assert_eq!(
            config.polling.interval_ms,
            Some(super::super::defaults::POLL_INTERVAL_MS)
        );
        assert_eq!(
            config.polling.max_attempts,
            Some(super::super::defaults::POLL_MAX_ATTEMPTS)
        );
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn template_contains_all_sections() {
        let template = default_config_template();

        for section in ["[[endpoints]]", "[build]", "[polling]", "[correlation]", "[transcript]"] {
            assert!(template.contains(section), "missing {section}");
        }
    }
}
