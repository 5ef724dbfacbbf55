// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI chat completion and audio transcription APIs.
//!
//! Provides [`OpenAiClient`], which handles authentication, JSON and multipart
//! request construction, error body decoding, and optional retry of
//! transient status codes.

use std::time::Duration;

use mockview_core::{AudioFormat, MockviewError};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, TranscriptionApiResponse};

/// Which API a request targets; decides the error variant callers see.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Chat,
    Transcription,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Self::Chat => "/chat/completions",
            Self::Transcription => "/audio/transcriptions",
        }
    }

    fn error(
        self,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> MockviewError {
        match self {
            Self::Chat => MockviewError::Provider { message, source },
            Self::Transcription => MockviewError::Transcription { message, source },
        }
    }
}

/// Parameters of a single transcription upload.
#[derive(Debug, Clone)]
pub struct TranscriptionUpload<'a> {
    pub audio: &'a [u8],
    pub format: AudioFormat,
    pub model: &'a str,
    pub language: Option<&'a str>,
    pub temperature: f32,
}

/// HTTP client for OpenAI-compatible APIs.
///
/// Connection pooling comes from the shared `reqwest::Client`. Transient
/// status codes (429, 500, 502, 503) are retried up to `max_retries` times.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a new client.
    ///
    /// `base_url` is the API root such as `https://api.openai.com/v1`.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, MockviewError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| MockviewError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MockviewError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a chat completion request.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, MockviewError> {
        let url = self.url(Endpoint::Chat);
        self.send(Endpoint::Chat, || Ok(self.client.post(&url).json(request)))
            .await
    }

    /// Uploads audio to the transcription endpoint with `verbose_json` output.
    pub async fn transcribe(
        &self,
        upload: &TranscriptionUpload<'_>,
    ) -> Result<TranscriptionApiResponse, MockviewError> {
        let url = self.url(Endpoint::Transcription);
        // Multipart forms are consumed on send, so each attempt builds its own.
        self.send(Endpoint::Transcription, || {
            let form = build_transcription_form(upload)?;
            Ok(self.client.post(&url).multipart(form))
        })
        .await
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn send<T, F>(&self, endpoint: Endpoint, build: F) -> Result<T, MockviewError>
    where
        T: DeserializeOwned,
        F: Fn() -> Result<reqwest::RequestBuilder, MockviewError>,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                warn!(attempt, path = endpoint.path(), "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = build()?.send().await.map_err(|e| {
                endpoint.error(format!("HTTP request failed: {e}"), Some(Box::new(e)))
            })?;

            let status = response.status();
            debug!(status = %status, attempt, path = endpoint.path(), "response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| {
                    endpoint.error(
                        format!("failed to read response body: {e}"),
                        Some(Box::new(e)),
                    )
                })?;
                return serde_json::from_str(&body).map_err(|e| {
                    endpoint.error(format!("failed to parse API response: {e}"), Some(Box::new(e)))
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                attempt += 1;
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "OpenAI API error ({}, {status}): {}",
                    api_err.error.label(),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(endpoint.error(message, None));
        }
    }
}

fn build_transcription_form(upload: &TranscriptionUpload<'_>) -> Result<Form, MockviewError> {
    let file = Part::bytes(upload.audio.to_vec())
        .file_name(format!("audio.{}", upload.format.extension()))
        .mime_str(upload.format.mime_type())
        .map_err(|e| MockviewError::Transcription {
            message: format!("invalid audio MIME type: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut form = Form::new()
        .part("file", file)
        .text("model", upload.model.to_string())
        .text("response_format", "verbose_json")
        .text("temperature", upload.temperature.to_string());
    if let Some(language) = upload.language {
        form = form.text("language", language.to_string());
    }
    Ok(form)
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}
