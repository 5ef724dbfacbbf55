// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for hosted model integrations.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod provider;
pub mod transcription;

pub use adapter::PluginAdapter;
pub use provider::ProviderAdapter;
pub use transcription::TranscriptionAdapter;
