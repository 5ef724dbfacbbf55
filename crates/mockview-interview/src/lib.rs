// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview engine for Mockview.
//!
//! The [`Coordinator`] is the single owner of interview state. For every
//! candidate turn it:
//! - Transcribes audio answers through the [`Recognizer`]
//! - Scores the answer with the [`Planner`], growing conversation memory
//! - Either asks one follow-up via the [`Chatbot`] or advances the interview
//! - Records the turn on the session
//!
//! All upstream calls share one [`CallGate`], which caps concurrency and
//! applies the per-call timeout.

pub mod chatbot;
pub mod coordinator;
pub mod gate;
pub mod memory;
pub mod planner;
pub mod prompts;
pub mod questions;
pub mod recognizer;
pub mod report;
pub mod session;
pub mod structured;

pub use chatbot::{Chatbot, FollowUp, GenerationMethod};
pub use coordinator::{
    AdvanceOutcome, AnalysisSummary, CLOSING_MESSAGE, ComponentHealth, Coordinator,
    CurrentQuestion, InterviewStatus, ManualFollowUp, ProviderHealth, StartedInterview,
    TurnAction, TurnContent, TurnInput, TurnOutcome,
};
pub use gate::CallGate;
pub use memory::ConversationMemory;
pub use planner::Planner;
pub use questions::{InterviewQuestion, QuestionBank, QuestionSource};
pub use recognizer::{Recognizer, Transcription};
pub use report::{InterviewReport, ReportGenerator, ReportWriter, SavedReport};
pub use session::{Session, SessionStore, spawn_eviction_sweeper};
