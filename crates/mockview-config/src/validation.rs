// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: required credentials, positive
//! limits, and audio formats the service knows how to upload.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::MockviewConfig;

/// Audio formats the transcription adapter can send.
pub const KNOWN_AUDIO_FORMATS: &[&str] = &["wav", "mp3", "m4a", "webm"];

const KNOWN_STYLES: &[&str] = &["formal", "casual", "campus"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &MockviewConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let has_key = config
        .openai
        .api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());
    if !has_key {
        errors.push(ConfigError::MissingKey {
            key: "openai.api_key".to_string(),
        });
    }

    if config.server.host.trim().is_empty() {
        errors.push(validation("server.host must not be empty"));
    }

    if config.server.allowed_origins.is_empty() {
        errors.push(validation(
            "server.allowed_origins must list at least one origin (use \"*\" to allow any)",
        ));
    }

    if !config.openai.base_url.starts_with("http://")
        && !config.openai.base_url.starts_with("https://")
    {
        errors.push(validation(format!(
            "openai.base_url `{}` must start with http:// or https://",
            config.openai.base_url
        )));
    }

    if config.openai.request_timeout_secs == 0 {
        errors.push(validation("openai.request_timeout_secs must be greater than 0"));
    }

    if config.audio.max_size_bytes == 0 {
        errors.push(validation("audio.max_size_bytes must be greater than 0"));
    }

    if config.audio.supported_formats.is_empty() {
        errors.push(validation("audio.supported_formats must not be empty"));
    }
    for format in &config.audio.supported_formats {
        if !KNOWN_AUDIO_FORMATS.contains(&format.to_ascii_lowercase().as_str()) {
            errors.push(validation(format!(
                "audio.supported_formats contains unsupported format `{format}` (known: {})",
                KNOWN_AUDIO_FORMATS.join(", ")
            )));
        }
    }

    if config.interview.max_questions == 0 {
        errors.push(validation("interview.max_questions must be greater than 0"));
    }

    if !KNOWN_STYLES.contains(&config.interview.default_style.to_ascii_lowercase().as_str()) {
        errors.push(validation(format!(
            "interview.default_style `{}` must be one of {}",
            config.interview.default_style,
            KNOWN_STYLES.join(", ")
        )));
    }

    let mut seen_ids = HashSet::new();
    for (i, question) in config.interview.questions.iter().enumerate() {
        if question.text.trim().is_empty() {
            errors.push(validation(format!(
                "interview.questions[{i}].text must not be empty"
            )));
        }
        if !seen_ids.insert(question.id.as_str()) {
            errors.push(validation(format!(
                "duplicate question id `{}` in [[interview.questions]]",
                question.id
            )));
        }
    }

    if config.limits.max_concurrent_calls == 0 {
        errors.push(validation("limits.max_concurrent_calls must be greater than 0"));
    }
    if config.limits.call_timeout_secs == 0 {
        errors.push(validation("limits.call_timeout_secs must be greater than 0"));
    }
    if config.limits.report_timeout_secs == 0 {
        errors.push(validation("limits.report_timeout_secs must be greater than 0"));
    }

    if config.session.ttl_secs > 0 && config.session.sweep_interval_secs == 0 {
        errors.push(validation(
            "session.sweep_interval_secs must be greater than 0 when session.ttl_secs is set",
        ));
    }

    if config.websocket.heartbeat_interval_secs == 0 {
        errors.push(validation("websocket.heartbeat_interval_secs must be greater than 0"));
    }

    if config.reports.output_dir.trim().is_empty() {
        errors.push(validation("reports.output_dir must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
