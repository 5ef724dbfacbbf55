// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end interview testing.
//!
//! `TestHarness` assembles a complete [`Coordinator`] with mock adapters and a
//! temporary reports directory. Provides `start()` and `answer()` to drive the
//! full turn pipeline in tests.

use std::sync::Arc;
use std::time::Duration;

use mockview_config::model::MockviewConfig;
use mockview_core::MockviewError;
use mockview_core::types::{InterviewStyle, TranscriptionResponse};
use mockview_interview::{Coordinator, QuestionBank, TurnInput, TurnOutcome};

use crate::mock_provider::MockChatModel;
use crate::mock_transcriber::MockTranscriber;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    transcripts: Vec<TranscriptionResponse>,
    chat_delay: Option<Duration>,
    transcription_delay: Option<Duration>,
    failing_chat: bool,
    config: MockviewConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = MockviewConfig::default();
        config.openai.api_key = Some("sk-test".to_string());
        Self {
            responses: Vec::new(),
            transcripts: Vec::new(),
            chat_delay: None,
            transcription_delay: None,
            failing_chat: false,
            config,
        }
    }

    /// Set mock chat model responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Set mock transcription results.
    pub fn with_transcripts(mut self, transcripts: Vec<TranscriptionResponse>) -> Self {
        self.transcripts = transcripts;
        self
    }

    /// Delay every chat call by `delay`.
    pub fn with_chat_delay(mut self, delay: Duration) -> Self {
        self.chat_delay = Some(delay);
        self
    }

    /// Delay every transcription call by `delay`.
    pub fn with_transcription_delay(mut self, delay: Duration) -> Self {
        self.transcription_delay = Some(delay);
        self
    }

    /// Make every chat call fail with a provider error.
    pub fn with_failing_chat(mut self) -> Self {
        self.failing_chat = true;
        self
    }

    /// Per-call timeout applied by the call gate.
    pub fn with_call_timeout(mut self, secs: u64) -> Self {
        self.config.limits.call_timeout_secs = secs;
        self
    }

    pub fn with_max_questions(mut self, max_questions: usize) -> Self {
        self.config.interview.max_questions = max_questions;
        self
    }

    /// Build the test harness, creating the reports directory and coordinator.
    pub fn build(self) -> Result<TestHarness, MockviewError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| MockviewError::Storage {
            source: Box::new(e),
        })?;

        let mut config = self.config;
        config.reports.output_dir = temp_dir.path().join("reports").display().to_string();

        let chat = if self.failing_chat {
            MockChatModel::failing()
        } else {
            MockChatModel::with_responses(self.responses)
        };
        let chat = Arc::new(match self.chat_delay {
            Some(delay) => chat.with_delay(delay),
            None => chat,
        });
        let transcriber = MockTranscriber::with_transcripts(self.transcripts);
        let transcriber = Arc::new(match self.transcription_delay {
            Some(delay) => transcriber.with_delay(delay),
            None => transcriber,
        });

        let coordinator = Arc::new(Coordinator::new(
            chat.clone(),
            transcriber.clone(),
            Arc::new(QuestionBank::from_config(&config.interview)),
            &config,
        ));

        Ok(TestHarness {
            coordinator,
            chat,
            transcriber,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp report storage.
pub struct TestHarness {
    pub coordinator: Arc<Coordinator>,
    /// The mock chat model.
    pub chat: Arc<MockChatModel>,
    /// The mock transcriber.
    pub transcriber: Arc<MockTranscriber>,
    pub config: MockviewConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Start a formal interview with a fresh session id.
    pub async fn start(&self) -> String {
        self.coordinator
            .start(None, Some(InterviewStyle::Formal))
            .await
            .session_id
    }

    /// Submit a text answer for `session_id`.
    pub async fn answer(&self, session_id: &str, text: &str) -> Result<TurnOutcome, MockviewError> {
        self.coordinator
            .process_turn(session_id, TurnInput::text(text))
            .await
    }

    /// Add a response to the mock chat model's queue.
    pub fn add_chat_response(&self, text: impl Into<String>) {
        self.chat.add_response(text);
    }
}
