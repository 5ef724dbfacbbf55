// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mockview integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without the hosted model API.
//!
//! # Components
//!
//! - [`MockChatModel`] - Mock chat model with pre-configured responses
//! - [`MockTranscriber`] - Mock speech-to-text adapter with queued transcripts
//! - [`TestHarness`] - Coordinator wired to both mocks and a temp reports directory

pub mod harness;
pub mod mock_provider;
pub mod mock_transcriber;

pub use harness::TestHarness;
pub use mock_provider::MockChatModel;
pub use mock_transcriber::MockTranscriber;
