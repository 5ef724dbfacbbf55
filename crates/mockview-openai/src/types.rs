// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat completion and audio transcription wire types.

use serde::{Deserialize, Serialize};

// --- Chat completion request types ---

/// A request to `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model identifier (e.g., "gpt-3.5-turbo").
    pub model: String,

    /// Conversation messages, system prompt first.
    pub messages: Vec<ApiMessage>,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Set to `json_object` to force a JSON reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// A chat message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    /// Null for some tool-call replies, which this client never requests.
    #[serde(default)]
    pub content: Option<String>,
}

/// Output format constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

// --- Chat completion response types ---

/// A non-streaming chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ApiMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

// --- Transcription types ---

/// A `verbose_json` transcription response.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionApiResponse {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub segments: Vec<ApiSegment>,
}

/// One decoded segment of a `verbose_json` transcript.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSegment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub avg_logprob: Option<f64>,
}

// --- Error types ---

/// Error envelope returned by the API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ApiErrorBody {
    /// Best available short label for log and error messages.
    pub fn label(&self) -> &str {
        self.code
            .as_deref()
            .or(self.type_.as_deref())
            .unwrap_or("unknown_error")
    }
}
