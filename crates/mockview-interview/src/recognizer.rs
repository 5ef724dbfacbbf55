// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech-to-text stage.
//!
//! [`Recognizer`] checks uploads against the configured format allow-list and
//! size ceiling, sends them to the transcription adapter through the call
//! gate, and attaches a confidence estimate to the transcript.

use std::sync::Arc;
use std::time::Instant;

use mockview_config::model::AudioConfig;
use mockview_core::traits::TranscriptionAdapter;
use mockview_core::types::{AudioFormat, TranscriptionRequest, TranscriptionResponse};
use mockview_core::MockviewError;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::gate::CallGate;

/// Language hint sent with every transcription.
const LANGUAGE_HINT: &str = "en";

/// A transcript with derived metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcription {
    pub text: String,
    /// Estimate in [0, 1]; see [`estimate_confidence`].
    pub confidence: f32,
    pub duration_secs: f64,
    pub language: String,
    pub processing_ms: u64,
}

/// Audio validation and transcription.
pub struct Recognizer {
    transcriber: Arc<dyn TranscriptionAdapter>,
    gate: CallGate,
    supported_formats: Vec<AudioFormat>,
    max_size_bytes: usize,
}

impl Recognizer {
    pub fn new(transcriber: Arc<dyn TranscriptionAdapter>, gate: CallGate, config: &AudioConfig) -> Self {
        let supported_formats = config
            .supported_formats
            .iter()
            .filter_map(|f| f.parse::<AudioFormat>().ok())
            .collect();

        Self {
            transcriber,
            gate,
            supported_formats,
            max_size_bytes: config.max_size_bytes,
        }
    }

    pub fn supported_formats(&self) -> &[AudioFormat] {
        &self.supported_formats
    }

    /// Parses a declared format name (`"wav"`, `"MP3"`, ...) against the allow-list.
    pub fn parse_format(&self, declared: &str) -> Result<AudioFormat, MockviewError> {
        declared
            .trim()
            .trim_start_matches('.')
            .parse::<AudioFormat>()
            .ok()
            .filter(|format| self.supported_formats.contains(format))
            .ok_or_else(|| self.unsupported(declared))
    }

    /// Checks format and size before any upstream call.
    pub fn validate(&self, audio: &[u8], format: AudioFormat) -> Result<(), MockviewError> {
        if !self.supported_formats.contains(&format) {
            return Err(self.unsupported(format.extension()));
        }
        if audio.is_empty() {
            return Err(MockviewError::InvalidAudio {
                reason: "audio data is empty".into(),
            });
        }
        if audio.len() > self.max_size_bytes {
            return Err(MockviewError::InvalidAudio {
                reason: format!(
                    "file too large: {} bytes (max: {})",
                    audio.len(),
                    self.max_size_bytes
                ),
            });
        }
        Ok(())
    }

    /// Validates and transcribes one upload.
    ///
    /// Upstream failures and timeouts are returned to the caller unchanged.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> Result<Transcription, MockviewError> {
        self.validate(&audio, format)?;

        let size = audio.len();
        let started = Instant::now();
        let request = TranscriptionRequest {
            audio,
            format,
            language: Some(LANGUAGE_HINT.to_string()),
            temperature: 0.0,
        };

        let response = self
            .gate
            .run(self.transcriber.transcribe(request))
            .await
            .inspect_err(|e| warn!(error = %e, "transcription failed"))?;

        let confidence = estimate_confidence(&response);
        let duration_secs = response
            .duration_secs
            .or_else(|| response.segments.last().map(|s| s.end))
            .unwrap_or(0.0);
        let transcription = Transcription {
            text: response.text.trim().to_string(),
            confidence,
            duration_secs,
            language: response
                .language
                .unwrap_or_else(|| LANGUAGE_HINT.to_string()),
            processing_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            bytes = size,
            %format,
            chars = transcription.text.len(),
            confidence = transcription.confidence,
            "transcription completed"
        );
        Ok(transcription)
    }

    fn unsupported(&self, declared: &str) -> MockviewError {
        let allowed: Vec<&str> = self.supported_formats.iter().map(|f| f.extension()).collect();
        MockviewError::InvalidAudio {
            reason: format!(
                "unsupported audio format `{declared}` (supported: {})",
                allowed.join(", ")
            ),
        }
    }
}

/// Confidence for a transcription response.
///
/// With per-segment log probabilities this is the mean of
/// `clamp(avg_logprob + 1, 0, 1)`. Otherwise it falls back to
/// [`heuristic_confidence`].
pub fn estimate_confidence(response: &TranscriptionResponse) -> f32 {
    let scores: Vec<f64> = response
        .segments
        .iter()
        .filter_map(|s| s.avg_logprob)
        .map(|logprob| (logprob + 1.0).clamp(0.0, 1.0))
        .collect();

    if scores.is_empty() {
        debug!("no segment log probabilities, using text heuristic");
        return heuristic_confidence(&response.text);
    }
    (scores.iter().sum::<f64>() / scores.len() as f64) as f32
}

/// Text-shape approximation of transcript quality.
///
/// This is not a probability. It rewards longer text, digits and sentence
/// punctuation, and penalizes text whose letters are all one case.
pub fn heuristic_confidence(text: &str) -> f32 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    let mut confidence: f32 = 0.7;
    if text.chars().count() > 10 {
        confidence += 0.1;
    }
    if text.chars().any(|c| c.is_ascii_digit()) {
        confidence += 0.05;
    }
    if text.contains('.') {
        confidence += 0.1;
    }

    let mut cased = text.chars().filter(|c| c.is_uppercase() || c.is_lowercase());
    if let Some(first) = cased.next() {
        let upper = first.is_uppercase();
        if cased.all(|c| c.is_uppercase() == upper) {
            confidence -= 0.2;
        }
    }

    confidence.clamp(0.0, 1.0)
}
