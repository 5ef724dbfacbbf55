// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech-to-text adapter trait.

use async_trait::async_trait;

use crate::error::MockviewError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{TranscriptionRequest, TranscriptionResponse};

/// Adapter for hosted speech-to-text models.
#[async_trait]
pub trait TranscriptionAdapter: PluginAdapter {
    /// Transcribes one audio clip. Implementations do not retry.
    async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionResponse, MockviewError>;
}
