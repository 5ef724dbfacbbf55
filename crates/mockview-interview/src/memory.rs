// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session conversation memory.
//!
//! Every analyzed answer is appended here in order. The analyzer renders the
//! whole memory into its prompt, and report generation reads it back. Entries
//! are never compressed or summarized.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

/// Text rendered when a session has no analyzed answers yet.
pub const NO_HISTORY: &str = "No conversation history";

/// One analyzed question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEntry {
    /// 1-based position in the conversation.
    pub round: usize,
    pub question: String,
    pub answer: String,
    pub recorded_at: DateTime<Utc>,
}

/// Conversation memory for all sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    entries: DashMap<String, Vec<MemoryEntry>>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair and returns its round number.
    pub fn append(&self, session_id: &str, question: &str, answer: &str) -> usize {
        let mut entries = self.entries.entry(session_id.to_string()).or_default();
        let round = entries.len() + 1;
        entries.push(MemoryEntry {
            round,
            question: question.to_string(),
            answer: answer.to_string(),
            recorded_at: Utc::now(),
        });
        debug!(session_id, round, "added answer to conversation memory");
        round
    }

    /// Snapshot of a session's entries, oldest first.
    pub fn entries(&self, session_id: &str) -> Vec<MemoryEntry> {
        self.entries
            .get(session_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self, session_id: &str) -> usize {
        self.entries.get(session_id).map_or(0, |e| e.len())
    }

    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }

    pub fn clear(&self, session_id: &str) {
        if self.entries.remove(session_id).is_some() {
            debug!(session_id, "conversation memory cleared");
        }
    }

    /// Renders the memory as numbered `Conversation round N:` blocks.
    pub fn render_transcript(&self, session_id: &str) -> String {
        let Some(entries) = self.entries.get(session_id) else {
            return NO_HISTORY.to_string();
        };
        if entries.is_empty() {
            return NO_HISTORY.to_string();
        }
        render_rounds(entries.iter().map(|e| (e.question.as_str(), e.answer.as_str())))
    }

    /// Renders the memory followed by a round that has not been recorded yet.
    pub fn render_transcript_with(&self, session_id: &str, question: &str, answer: &str) -> String {
        match self.entries.get(session_id) {
            Some(entries) => render_rounds(
                entries
                    .iter()
                    .map(|e| (e.question.as_str(), e.answer.as_str()))
                    .chain(std::iter::once((question, answer))),
            ),
            None => render_rounds(std::iter::once((question, answer))),
        }
    }
}

fn render_rounds<'a>(rounds: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut lines = Vec::new();
    for (index, (question, answer)) in rounds.enumerate() {
        lines.push(format!("Conversation round {}:", index + 1));
        lines.push(format!("Question: {question}"));
        lines.push(format!("Answer: {answer}"));
        lines.push("---".to_string());
    }
    lines.join("\n")
}
