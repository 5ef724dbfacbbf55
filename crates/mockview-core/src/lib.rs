// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mockview interview service.
//!
//! This crate provides the adapter traits, error type, and domain types
//! shared by the model client, the interview engine, and the gateway.

pub mod assessment;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use assessment::{FocusArea, FollowUpStrategy, QualityAssessment, select_strategy};
pub use error::MockviewError;
pub use types::{AdapterType, AudioFormat, HealthStatus, InputType, InterviewStyle};

pub use traits::{PluginAdapter, ProviderAdapter, TranscriptionAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mockview_error_has_all_variants() {
        let _config = MockviewError::Config("test".into());
        let _audio = MockviewError::InvalidAudio {
            reason: "test".into(),
        };
        let _input = MockviewError::InvalidInput("test".into());
        let _not_found = MockviewError::SessionNotFound("s".into());
        let _busy = MockviewError::TurnInProgress("s".into());
        let _limit = MockviewError::FollowUpLimitReached {
            session_id: "s".into(),
            question_index: 0,
        };
        let _history = MockviewError::NoHistory("s".into());
        let _provider = MockviewError::provider("test");
        let _transcription = MockviewError::transcription("test");
        let _schema = MockviewError::Schema {
            message: "test".into(),
        };
        let _timeout = MockviewError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _storage = MockviewError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _internal = MockviewError::Internal("test".into());
    }

    #[test]
    fn upstream_errors_are_recoverable() {
        assert!(MockviewError::provider("x").is_recoverable());
        assert!(
            MockviewError::Timeout {
                duration: std::time::Duration::from_secs(1)
            }
            .is_recoverable()
        );
        assert!(!MockviewError::SessionNotFound("s".into()).is_recoverable());
        assert!(
            !MockviewError::InvalidAudio {
                reason: "big".into()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(MockviewError::NoHistory("s".into()).error_code(), "no_history");
        assert_eq!(
            MockviewError::InvalidInput("x".into()).error_code(),
            "validation_error"
        );
        assert_eq!(MockviewError::Internal("x".into()).error_code(), "internal_error");
    }

    #[test]
    fn audio_format_parses_case_insensitively() {
        use std::str::FromStr;

        assert_eq!(AudioFormat::from_str("WAV").unwrap(), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_str("m4a").unwrap(), AudioFormat::M4a);
        assert!(AudioFormat::from_str("flac").is_err());
        for format in AudioFormat::ALL {
            assert_eq!(AudioFormat::from_str(&format.to_string()).unwrap(), format);
        }
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
    }

    #[test]
    fn interview_style_defaults_to_formal() {
        assert_eq!(InterviewStyle::default(), InterviewStyle::Formal);
        let parsed: InterviewStyle = serde_json::from_str("\"campus\"").unwrap();
        assert_eq!(parsed, InterviewStyle::Campus);
        assert_eq!(InterviewStyle::Casual.to_string(), "casual");
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        for variant in [AdapterType::Provider, AdapterType::Transcription] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_transcription_adapter<T: TranscriptionAdapter>() {}
    }
}
