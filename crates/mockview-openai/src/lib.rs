// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI adapter for the Mockview interview service.
//!
//! [`OpenAiProvider`] implements both [`ProviderAdapter`] (chat completions,
//! used for analysis, follow-ups and reports) and [`TranscriptionAdapter`]
//! (Whisper-style speech to text).

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use mockview_config::model::OpenAiConfig;
use mockview_core::error::MockviewError;
use mockview_core::traits::{PluginAdapter, ProviderAdapter, TranscriptionAdapter};
use mockview_core::types::{
    AdapterType, ChatRequest, ChatResponse, HealthStatus, TokenUsage, TranscriptSegment,
    TranscriptionRequest, TranscriptionResponse,
};
use tracing::{debug, info};

use crate::client::{OpenAiClient, TranscriptionUpload};
use crate::types::{ApiMessage, ChatCompletionRequest, ChatCompletionResponse, ResponseFormat};

/// OpenAI provider implementing chat and transcription adapters.
///
/// API key resolution order: `openai.api_key` in config, then the
/// `OPENAI_API_KEY` environment variable.
pub struct OpenAiProvider {
    client: OpenAiClient,
    chat_model: String,
    transcription_model: String,
}

impl OpenAiProvider {
    /// Creates a provider from the `[openai]` config section.
    pub fn new(config: &OpenAiConfig) -> Result<Self, MockviewError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = OpenAiClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
            config.max_retries,
        )?;

        info!(
            chat_model = config.chat_model,
            transcription_model = config.transcription_model,
            base_url = config.base_url,
            "OpenAI provider initialized"
        );

        Ok(Self::with_client(
            client,
            config.chat_model.clone(),
            config.transcription_model.clone(),
        ))
    }

    /// Creates a provider around an existing client.
    pub fn with_client(client: OpenAiClient, chat_model: String, transcription_model: String) -> Self {
        Self {
            client,
            chat_model,
            transcription_model,
        }
    }

    /// Converts a [`ChatRequest`] to the wire request.
    fn to_completion_request(&self, request: &ChatRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.chat_model.clone()),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_output.then(ResponseFormat::json_object),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MockviewError> {
        // Reports configuration health only; probing the API would spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MockviewError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, MockviewError> {
        let api_request = self.to_completion_request(&request);
        let response = self.client.chat_completion(&api_request).await?;
        into_chat_response(response)
    }
}

#[async_trait]
impl TranscriptionAdapter for OpenAiProvider {
    async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionResponse, MockviewError> {
        let upload = TranscriptionUpload {
            audio: &request.audio,
            format: request.format,
            model: &self.transcription_model,
            language: request.language.as_deref(),
            temperature: request.temperature,
        };
        let response = self.client.transcribe(&upload).await?;

        Ok(TranscriptionResponse {
            text: response.text.trim().to_string(),
            language: response.language,
            duration_secs: response.duration,
            segments: response
                .segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    text: s.text,
                    start: s.start,
                    end: s.end,
                    avg_logprob: s.avg_logprob,
                })
                .collect(),
        })
    }
}

fn into_chat_response(response: ChatCompletionResponse) -> Result<ChatResponse, MockviewError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| MockviewError::provider("completion response contained no message content"))?;

    let usage = response.usage.unwrap_or_default();
    Ok(ChatResponse {
        id: response.id,
        content,
        model: response.model,
        usage: TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    })
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, MockviewError> {
    if let Some(key) = config_key
        && !key.trim().is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            MockviewError::Config(
                "OpenAI API key not found. Set openai.api_key in config or the OPENAI_API_KEY environment variable.".into(),
            )
        })
}
