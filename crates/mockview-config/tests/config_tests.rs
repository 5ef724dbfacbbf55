// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Mockview configuration system.

use figment::Jail;
use mockview_config::diagnostic::ConfigError;
use mockview_config::{load_and_validate_str, load_config, load_config_from_str};

const WITH_KEY: &str = r#"
[openai]
api_key = "sk-test"
"#;

/// A file setting every section deserializes into the expected values.
#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
allowed_origins = ["https://interviews.example.com"]
environment = "production"
debug = true

[openai]
api_key = "sk-123"
base_url = "http://localhost:4010/v1"
chat_model = "gpt-4o-mini"
transcription_model = "whisper-large"
request_timeout_secs = 10
max_retries = 2

[audio]
supported_formats = ["wav", "webm"]
max_size_bytes = 1000

[interview]
max_questions = 4
default_style = "campus"

[limits]
max_concurrent_calls = 4
call_timeout_secs = 5
report_timeout_secs = 10

[session]
ttl_secs = 0

[websocket]
heartbeat_interval_secs = 10
inactivity_timeout_secs = 60

[reports]
output_dir = "/tmp/reports"

[logging]
level = "trace"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.port, 8080);
    assert!(config.server.debug);
    assert_eq!(config.openai.api_key.as_deref(), Some("sk-123"));
    assert_eq!(config.openai.max_retries, 2);
    assert_eq!(config.audio.supported_formats, vec!["wav", "webm"]);
    assert_eq!(config.interview.max_questions, 4);
    assert_eq!(config.limits.call_timeout_secs, 5);
    assert_eq!(config.session.ttl_secs, 0);
    assert_eq!(config.websocket.inactivity_timeout_secs, 60);
    assert_eq!(config.reports.output_dir, "/tmp/reports");
    assert_eq!(config.log_level(), "trace");
}

/// Empty TOML falls back to defaults for every section.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert!(config.openai.api_key.is_none());
    assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    assert_eq!(config.limits.report_timeout_secs, 60);
    assert_eq!(config.session.ttl_secs, 86_400);
}

/// Unknown top-level section is rejected by deny_unknown_fields.
#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[metrics]\nenabled = true\n")
        .expect_err("unknown section should be rejected");
    let err_str = err.to_string();
    assert!(
        err_str.contains("unknown field") || err_str.contains("metrics"),
        "got: {err_str}"
    );
}

/// Misspelled key yields an UnknownKey diagnostic with a suggestion.
#[test]
fn typo_produces_suggestion() {
    let toml = r#"
[openai]
api_key = "sk-test"
chat_modle = "gpt-4o"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "chat_modle"
                && suggestion.as_deref() == Some("chat_model")
                && valid_keys.contains("transcription_model")
        })
    });
    assert!(found, "expected UnknownKey for chat_modle, got: {errors:?}");
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))),
        "got: {errors:?}"
    );
}

/// Validation runs after a successful parse and requires the API key.
#[test]
fn validation_requires_api_key() {
    let errors = load_and_validate_str("").expect_err("missing key should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key == "openai.api_key"))
    );

    let config = load_and_validate_str(WITH_KEY).expect("key present should validate");
    assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
}

/// Diagnostics render through miette with code and help.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "prot".to_string(),
        suggestion: Some("port".to_string()),
        valid_keys: "host, port, allowed_origins".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `port`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("prot"));
}

/// `MOCKVIEW_*` variables override files, mapped by section prefix.
#[test]
fn env_vars_override_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file("mockview.toml", "[server]\nport = 9000\n")?;
        jail.set_env("MOCKVIEW_SERVER_PORT", "9100");
        jail.set_env("MOCKVIEW_LIMITS_CALL_TIMEOUT_SECS", "12");
        jail.set_env("MOCKVIEW_OPENAI_API_KEY", "sk-env");

        let config = load_config()?;
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.limits.call_timeout_secs, 12);
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-env"));
        Ok(())
    });
}

/// The conventional `OPENAI_API_KEY` variable fills `openai.api_key`.
#[test]
fn bare_openai_key_is_honored() {
    Jail::expect_with(|jail| {
        jail.set_env("OPENAI_API_KEY", "sk-bare");

        let config = load_config()?;
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-bare"));
        Ok(())
    });
}

/// A local file alone is picked up from the working directory.
#[test]
fn local_file_is_loaded() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "mockview.toml",
            "[interview]\nmax_questions = 4\ndefault_style = \"casual\"\n",
        )?;

        let config = load_config()?;
        assert_eq!(config.interview.max_questions, 4);
        assert_eq!(config.interview.default_style, "casual");
        Ok(())
    });
}
