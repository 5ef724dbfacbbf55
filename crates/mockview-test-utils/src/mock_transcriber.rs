// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock speech-to-text adapter.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use mockview_core::MockviewError;
use mockview_core::traits::adapter::PluginAdapter;
use mockview_core::traits::transcription::TranscriptionAdapter;
use mockview_core::types::{
    AdapterType, HealthStatus, TranscriptionRequest, TranscriptionResponse,
};

use crate::mock_provider::lock;

/// Transcript returned once the queue is exhausted.
pub const DEFAULT_TRANSCRIPT: &str = "This is a mock transcript.";

/// A mock transcriber returning queued transcripts in FIFO order.
pub struct MockTranscriber {
    transcripts: Mutex<VecDeque<TranscriptionResponse>>,
    requests: Mutex<Vec<TranscriptionRequest>>,
    calls: AtomicUsize,
    failing: bool,
    delay: Option<Duration>,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self::with_transcripts(Vec::new())
    }

    pub fn with_transcripts(transcripts: Vec<TranscriptionResponse>) -> Self {
        Self {
            transcripts: Mutex::new(VecDeque::from(transcripts)),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            failing: false,
            delay: None,
        }
    }

    /// A transcriber whose every call fails with a transcription error.
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

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TranscriptionRequest> {
        lock(&self.requests).clone()
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTranscriber {
    fn name(&self) -> &str {
        "mock-transcriber"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transcription
    }

    async fn health_check(&self) -> Result<HealthStatus, MockviewError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MockviewError> {
        Ok(())
    }
}

#[async_trait]
impl TranscriptionAdapter for MockTranscriber {
    async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionResponse, MockviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing {
            return Err(MockviewError::transcription("mock transcription failure"));
        }

        Ok(lock(&self.transcripts)
            .pop_front()
            .unwrap_or_else(|| TranscriptionResponse {
                text: DEFAULT_TRANSCRIPT.to_string(),
                language: Some("en".into()),
                duration_secs: Some(2.0),
                segments: Vec::new(),
            }))
    }
}
