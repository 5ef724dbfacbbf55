// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat model for deterministic testing.
//!
//! `MockChatModel` implements `ProviderAdapter` with pre-configured responses,
//! enabling fast, CI-runnable tests without calling the hosted API.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use mockview_core::MockviewError;
use mockview_core::traits::adapter::PluginAdapter;
use mockview_core::traits::provider::ProviderAdapter;
use mockview_core::types::{AdapterType, ChatRequest, ChatResponse, HealthStatus, TokenUsage};

/// Returned once the response queue is exhausted.
pub const DEFAULT_RESPONSE: &str = "mock response";

const MOCK_MODEL: &str = "mock-chat";

/// A mock chat model that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty,
/// [`DEFAULT_RESPONSE`] is returned. Every request is recorded.
pub struct MockChatModel {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    failing: bool,
}

impl MockChatModel {
    /// Create a new mock model with an empty response queue.
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a mock model pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
            failing: false,
        }
    }

    /// A mock model whose every call fails with a provider error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Sleep for `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a response to the end of the queue.
    pub fn add_response(&self, text: impl Into<String>) {
        lock(&self.responses).push_back(text.into());
    }

    /// Number of `complete` calls received, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All requests received, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    fn next_response(&self) -> String {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| DEFAULT_RESPONSE.to_string())
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChatModel {
    fn name(&self) -> &str {
        "mock-chat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MockviewError> {
        if self.failing {
            return Ok(HealthStatus::Unhealthy("mock failure".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MockviewError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockChatModel {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, MockviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| MOCK_MODEL.to_string());
        lock(&self.requests).push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(MockviewError::provider("mock provider failure"));
        }

        Ok(ChatResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content: self.next_response(),
            model,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }
}

/// Locks a recorder mutex, ignoring poisoning from a panicked test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
