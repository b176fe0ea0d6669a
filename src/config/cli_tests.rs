//! Tests for CLI argument parsing.

use super::cli::{Cli, Command, PolicyArg, ProfileArg};

mod parsing {
    use super::*;

    #[test]
    fn parse_send_command() {
        let cli = Cli::parse_from_iter([
            "automation-relay",
            "send",
            "--payload",
            r#"{"message":"hi"}"#,
        ]);

        match cli.command {
            Command::Send { payload } => assert_eq!(payload, r#"{"message":"hi"}"#),
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn parse_poll_command() {
        let cli = Cli::parse_from_iter([
            "automation-relay",
            "poll",
            "conv-42",
            "--max-attempts",
            "5",
        ]);

        match cli.command {
            Command::Poll {
                conversation_id,
                max_attempts,
            } => {
                assert_eq!(conversation_id, "conv-42");
                assert_eq!(max_attempts, Some(5));
            }
            other => panic!("expected poll, got {other:?}"),
        }
    }

    #[test]
    fn parse_repeated_endpoints() {
        let cli = Cli::parse_from_iter([
            "automation-relay",
            "--endpoint",
            "prod=https://automation.example.com/webhook",
            "--endpoint",
            "http://localhost:5678/webhook",
            "poll",
            "c1",
        ]);

        assert_eq!(cli.endpoints.len(), 2);
        assert_eq!(cli.endpoints[0], "prod=https://automation.example.com/webhook");
        assert_eq!(cli.endpoints[1], "http://localhost:5678/webhook");
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::parse_from_iter([
            "automation-relay",
            "poll",
            "c1",
            "--profile",
            "prod",
            "--policy",
            "replace",
            "--poll-interval-ms",
            "500",
            "--initial-delay-ms",
            "0",
            "--transcript",
            "out.jsonl",
            "-v",
        ]);

        assert_eq!(cli.profile, Some(ProfileArg::Production));
        assert_eq!(cli.policy, Some(PolicyArg::Replace));
        assert_eq!(cli.poll_interval_ms, Some(500));
        assert_eq!(cli.initial_delay_ms, Some(0));
        assert_eq!(
            cli.transcript.as_deref().and_then(|p| p.to_str()),
            Some("out.jsonl")
        );
        assert!(cli.verbose);
    }

    #[test]
    fn default_values() {
        let cli = Cli::parse_from_iter(["automation-relay", "poll", "c1"]);

        assert!(cli.endpoints.is_empty());
        assert!(cli.profile.is_none());
        assert!(cli.policy.is_none());
        assert!(cli.poll_interval_ms.is_none());
        assert!(cli.initial_delay_ms.is_none());
        assert!(cli.transcript.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }
}

mod init_command {
    use super::*;

    #[test]
    fn init_default_output() {
        let cli = Cli::parse_from_iter(["automation-relay", "init"]);

        assert!(cli.is_init());
        match cli.command {
            Command::Init { output } => {
                assert_eq!(output.to_str(), Some("automation-relay.toml"));
            }
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn init_custom_output() {
        let cli = Cli::parse_from_iter(["automation-relay", "init", "--output", "custom.toml"]);

        match cli.command {
            Command::Init { output } => assert_eq!(output.to_str(), Some("custom.toml")),
            other => panic!("expected init, got {other:?}"),
        }
    }
}

mod rejection {
    use super::*;

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from_iter(["automation-relay"]).is_err());
    }

    #[test]
    fn send_requires_payload() {
        assert!(Cli::try_parse_from_iter(["automation-relay", "send"]).is_err());
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let result =
            Cli::try_parse_from_iter(["automation-relay", "--profile", "staging", "poll", "c1"]);
        assert!(result.is_err());
    }

    #[test]
    fn non_numeric_interval_is_rejected() {
        let result = Cli::try_parse_from_iter([
            "automation-relay",
            "--poll-interval-ms",
            "fast",
            "poll",
            "c1",
        ]);
        assert!(result.is_err());
    }
}
