// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Main interview questions.

use mockview_config::model::InterviewConfig;
use serde::Serialize;

/// A predefined main question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterviewQuestion {
    pub id: String,
    pub text: String,
    pub category: String,
}

impl InterviewQuestion {
    pub fn new(id: impl Into<String>, text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: category.into(),
        }
    }
}

/// Ordered list of main questions a coordinator walks through.
pub trait QuestionSource: Send + Sync {
    fn question(&self, index: usize) -> Option<&InterviewQuestion>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed, in-memory question list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<InterviewQuestion>,
}

impl QuestionBank {
    pub fn new(questions: Vec<InterviewQuestion>) -> Self {
        Self { questions }
    }

    /// The four built-in behavioral questions.
    pub fn builtin() -> Self {
        Self::new(vec![
            InterviewQuestion::new(
                "self_introduction",
                "Please introduce yourself briefly, including your background, key experiences, and what you're looking for in your next role.",
                "introduction",
            ),
            InterviewQuestion::new(
                "achievement",
                "Tell me about a recent achievement you are most proud of. What role did you play?",
                "behavioral",
            ),
            InterviewQuestion::new(
                "conflict_resolution",
                "Describe a time when you overcame a conflict or challenge.",
                "behavioral",
            ),
            InterviewQuestion::new(
                "team_integration",
                "How do you approach joining a new team and integrating with existing team members?",
                "behavioral",
            ),
        ])
    }

    /// Configured questions, or the built-in list, capped at `max_questions`.
    pub fn from_config(config: &InterviewConfig) -> Self {
        let mut bank = if config.questions.is_empty() {
            Self::builtin()
        } else {
            Self::new(
                config
                    .questions
                    .iter()
                    .map(|q| InterviewQuestion::new(&q.id, &q.text, &q.category))
                    .collect(),
            )
        };
        bank.questions.truncate(config.max_questions);
        bank
    }

    pub fn questions(&self) -> &[InterviewQuestion] {
        &self.questions
    }
}

impl QuestionSource for QuestionBank {
    fn question(&self, index: usize) -> Option<&InterviewQuestion> {
        self.questions.get(index)
    }

    fn len(&self) -> usize {
        self.questions.len()
    }
}
