// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for hosted chat completion models.

use async_trait::async_trait;

use crate::error::MockviewError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatRequest, ChatResponse};

/// Adapter for chat completion providers.
///
/// Used for answer analysis, follow-up generation and report writing.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, MockviewError>;
}
