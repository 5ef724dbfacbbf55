// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mockview interview service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level Mockview configuration.
///
/// Every section is optional and defaults to values suitable for local
/// development. Only `openai.api_key` has no usable default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MockviewConfig {
    /// HTTP listener and CORS settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted model API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Audio upload limits.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Question bank and interview flow settings.
    #[serde(default)]
    pub interview: InterviewConfig,

    /// Outbound call concurrency and timeouts.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Session retention.
    #[serde(default)]
    pub session: SessionConfig,

    /// WebSocket heartbeat settings.
    #[serde(default)]
    pub websocket: WebSocketConfig,

    /// Report output location.
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Log verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer. `*` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Deployment environment name (`development`, `production`, ...).
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Include internal error details in error envelopes.
    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            environment: default_environment(),
            debug: false,
        }
    }
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_environment() -> String {
    "development".to_string()
}

/// OpenAI-compatible API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. Also read from `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chat completion model used for analysis, follow-ups and reports.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Speech-to-text model.
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    /// HTTP request timeout for a single API call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries on transient HTTP status codes. Zero disables retries.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            transcription_model: default_transcription_model(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    25
}

/// Audio upload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AudioConfig {
    /// Accepted container formats (`wav`, `mp3`, `m4a`, `webm`).
    #[serde(default = "default_supported_formats")]
    pub supported_formats: Vec<String>,

    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            supported_formats: default_supported_formats(),
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

fn default_supported_formats() -> Vec<String> {
    ["wav", "mp3", "m4a", "webm"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_size_bytes() -> usize {
    25_000_000
}

/// Interview flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InterviewConfig {
    /// Number of predefined questions asked per interview.
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,

    /// Style used when a client does not choose one (`formal`, `casual`, `campus`).
    #[serde(default = "default_style")]
    pub default_style: String,

    /// Custom question bank. Empty uses the built-in questions.
    #[serde(default)]
    pub questions: Vec<QuestionConfig>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
            default_style: default_style(),
            questions: Vec::new(),
        }
    }
}

fn default_max_questions() -> usize {
    3
}

fn default_style() -> String {
    "formal".to_string()
}

/// A custom interview question.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionConfig {
    pub id: String,
    pub text: String,
    #[serde(default = "default_question_category")]
    pub category: String,
}

fn default_question_category() -> String {
    "behavioral".to_string()
}

/// Outbound call limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Model or transcription calls allowed in flight at once.
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Timeout applied to each analysis, follow-up and transcription call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Timeout applied to report generation.
    #[serde(default = "default_report_timeout_secs")]
    pub report_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: default_max_concurrent_calls(),
            call_timeout_secs: default_call_timeout_secs(),
            report_timeout_secs: default_report_timeout_secs(),
        }
    }
}

fn default_max_concurrent_calls() -> usize {
    15
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_report_timeout_secs() -> u64 {
    60
}

/// Session retention configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Idle time after which a session and its history are evicted. 0 keeps sessions forever.
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,

    /// How often the eviction sweep runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    86_400
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// WebSocket connection management.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebSocketConfig {
    /// Interval between inactivity sweeps.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Connections idle longer than this are closed.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
        }
    }
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_inactivity_timeout_secs() -> u64 {
    300
}

/// Report persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportsConfig {
    /// Root directory; reports go into date-stamped subdirectories.
    #[serde(default = "default_reports_dir")]
    pub output_dir: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_reports_dir(),
        }
    }
}

fn default_reports_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("mockview").join("reports"))
        .unwrap_or_else(|| std::path::PathBuf::from("reports"))
        .to_string_lossy()
        .into_owned()
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level filter (trace, debug, info, warn, error). Unset means `debug`
    /// in development and `info` otherwise.
    #[serde(default)]
    pub level: Option<String>,
}

impl MockviewConfig {
    /// Effective log level after applying the environment default.
    pub fn log_level(&self) -> &str {
        match self.logging.level.as_deref() {
            Some(level) => level,
            None if self.server.is_development() => "debug",
            None => "info",
        }
    }
}
