// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mockview interview service.

use thiserror::Error;

/// The primary error type used across adapters, interview components and the gateway.
#[derive(Debug, Error)]
pub enum MockviewError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Uploaded audio was rejected before reaching the transcription API.
    #[error("invalid audio: {reason}")]
    InvalidAudio { reason: String },

    /// Malformed client input (empty answer, bad base64, unknown style).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No session exists for the given identifier.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Another turn for the same session is still being processed.
    #[error("a turn is already in progress for session {0}")]
    TurnInProgress(String),

    /// The single follow-up allowed for the current question was already asked.
    #[error("follow-up limit reached for question {question_index} of session {session_id}")]
    FollowUpLimitReached {
        session_id: String,
        question_index: usize,
    },

    /// Report generation was requested before any answer was analyzed.
    #[error("no conversation history found for session {0}")]
    NoHistory(String),

    /// Chat model errors (API failure, rate limiting, malformed response body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Speech-to-text errors.
    #[error("transcription error: {message}")]
    Transcription {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Model output could not be parsed into the expected structure.
    #[error("model output did not match schema: {message}")]
    Schema { message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Report persistence errors.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MockviewError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a transcription error without an underlying source.
    pub fn transcription(message: impl Into<String>) -> Self {
        Self::Transcription {
            message: message.into(),
            source: None,
        }
    }

    /// Whether a component may recover from this error with fallback content.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. }
                | Self::Transcription { .. }
                | Self::Schema { .. }
                | Self::Timeout { .. }
        )
    }

    /// Stable machine-readable code used in HTTP and WebSocket error payloads.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::InvalidAudio { .. } => "invalid_audio",
            Self::InvalidInput(_) => "validation_error",
            Self::SessionNotFound(_) => "session_not_found",
            Self::TurnInProgress(_) => "turn_in_progress",
            Self::FollowUpLimitReached { .. } => "followup_limit_reached",
            Self::NoHistory(_) => "no_history",
            Self::Provider { .. } => "provider_error",
            Self::Transcription { .. } => "transcription_error",
            Self::Schema { .. } => "schema_error",
            Self::Timeout { .. } => "timeout",
            Self::Storage { .. } => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }
}
