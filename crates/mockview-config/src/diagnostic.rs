// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics rendered with miette.
//!
//! Figment errors are converted into [`ConfigError`] values that carry the
//! offending TOML source, a label on the bad key, and a "did you mean"
//! suggestion computed with Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum similarity for a key to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no config section declares.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(mockview::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(mockview::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required key has no value.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(mockview::config::missing_key),
        help("set `{key}` in mockview.toml or through its MOCKVIEW_* environment variable")
    )]
    MissingKey { key: String },

    /// A value that parsed but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(mockview::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no dedicated variant.
    #[error("configuration error: {0}")]
    #[diagnostic(code(mockview::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
///
/// `toml_sources` pairs a file path with its content so unknown keys can be
/// pointed at in the original file.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let suggestion = suggest_key(field, expected);
                let (span, src) = locate_key(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion,
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Finds the file and byte span of an unknown key, when the error came from a file.
fn locate_key(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(path)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let path = path.display().to_string();

    let Some((name, content)) = toml_sources.iter().find(|(p, _)| *p == path) else {
        return (None, None);
    };

    match find_key_offset(content, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside the TOML table named by `path`.
///
/// `path = ["openai"]` searches after the `[openai]` header; an empty path
/// searches from the top of the file.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        None => 0,
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && offset != start {
            // Reached the next table without finding the key.
            return None;
        }
        if let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }

    None
}

/// Best match for `unknown` among `valid_keys`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key() {
        let valid = &["chat_model", "transcription_model", "base_url"];
        assert_eq!(suggest_key("chat_modle", valid), Some("chat_model".to_string()));
    }

    #[test]
    fn suggests_best_of_several_candidates() {
        let valid = &["max_questions", "questions", "default_style"];
        assert_eq!(
            suggest_key("max_question", valid),
            Some("max_questions".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_unrelated_key() {
        let valid = &["host", "port", "debug"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn finds_key_inside_section() {
        let content = "[server]\nport = 9000\n\n[openai]\nchat_modle = \"x\"\n";
        let path = vec!["openai".to_string()];
        let offset = find_key_offset(content, &path, "chat_modle").unwrap();
        assert_eq!(&content[offset..offset + 10], "chat_modle");
    }

    #[test]
    fn does_not_match_key_in_following_section() {
        let content = "[server]\nport = 9000\n[openai]\nhost = \"x\"\n";
        let path = vec!["server".to_string()];
        assert_eq!(find_key_offset(content, &path, "host"), None);
    }

    #[test]
    fn missing_key_help_mentions_env_override() {
        let error = ConfigError::MissingKey {
            key: "openai.api_key".to_string(),
        };
        let help = error.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("MOCKVIEW_"));
    }
}
