// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Follow-up question generation.
//!
//! [`Chatbot::generate`] picks a prompt template from the assessment's
//! strategy, asks the chat model for one question, and normalizes the reply.
//! When the model fails it draws from a static bank keyed by focus area, so
//! generation itself never fails.

use std::sync::Arc;

use mockview_core::assessment::{FocusArea, FollowUpStrategy, select_strategy};
use mockview_core::traits::ProviderAdapter;
use mockview_core::types::InterviewStyle;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use strum::Display;
use tracing::{debug, warn};

use crate::gate::CallGate;
use crate::prompts::{FollowUpPrompt, SamplingProfile, follow_up_messages};

/// Question used when cleaning leaves nothing.
pub const DEFAULT_FOLLOW_UP: &str = "Can you tell me more about that experience?";

/// Confidence reported for model-generated questions.
pub const MODEL_CONFIDENCE: f32 = 0.8;

/// Confidence reported for template fallbacks.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

const BOILERPLATE_PREFIXES: &[&str] = &[
    "Here's a follow-up question:",
    "Follow-up question:",
    "I'd like to ask:",
    "Question:",
];

const CAMPUS_OPENERS: &[&str] = &["That's interesting! ", "I'd love to hear more - ", "Great! "];

/// How a follow-up was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    Model,
    TemplateFallback,
}

/// A generated follow-up question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUp {
    pub question: String,
    pub strategy: FollowUpStrategy,
    pub method: GenerationMethod,
    pub confidence: f32,
}

/// Follow-up generator.
pub struct Chatbot {
    provider: Arc<dyn ProviderAdapter>,
    gate: CallGate,
}

impl Chatbot {
    pub fn new(provider: Arc<dyn ProviderAdapter>, gate: CallGate) -> Self {
        Self { provider, gate }
    }

    /// Generates one follow-up question for an assessed answer.
    pub async fn generate(&self, session_id: &str, input: &FollowUpPrompt<'_>) -> FollowUp {
        let strategy = select_strategy(input.assessment);
        let request = SamplingProfile::for_strategy(strategy)
            .request(follow_up_messages(strategy, input), false);

        match self.gate.run(self.provider.complete(request)).await {
            Ok(response) => {
                let question = apply_style(&clean_question(&response.content), input.style);
                debug!(session_id, %strategy, "follow-up generated");
                FollowUp {
                    question,
                    strategy,
                    method: GenerationMethod::Model,
                    confidence: MODEL_CONFIDENCE,
                }
            }
            Err(e) => {
                warn!(session_id, %strategy, error = %e, "follow-up generation failed, using template");
                let mut rng = rand::thread_rng();
                let raw = fallback_question(input.assessment.suggested_focus, input.answer, &mut rng);
                FollowUp {
                    question: apply_style_with(&clean_question(&raw), input.style, &mut rng),
                    strategy,
                    method: GenerationMethod::TemplateFallback,
                    confidence: FALLBACK_CONFIDENCE,
                }
            }
        }
    }
}

/// Normalizes raw model text into a single question.
///
/// Strips boilerplate prefixes and wrapping quotes, capitalizes the first
/// character, drops trailing `.`/`!`, and ensures a trailing `?`.
/// Idempotent.
pub fn clean_question(raw: &str) -> String {
    let mut text = raw.trim();
    loop {
        let before = text.len();
        for prefix in BOILERPLATE_PREFIXES {
            if let Some(head) = text.get(..prefix.len())
                && head.eq_ignore_ascii_case(prefix)
            {
                text = text[prefix.len()..].trim_start();
            }
        }
        text = text.trim_matches('"').trim();
        if text.len() == before {
            break;
        }
    }

    let text = text.trim_end_matches(|c: char| c == '.' || c == '!' || c.is_whitespace());
    if text.is_empty() {
        return DEFAULT_FOLLOW_UP.to_string();
    }

    let mut chars = text.chars();
    let mut cleaned: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    if !cleaned.ends_with('?') {
        cleaned.push('?');
    }
    cleaned
}

/// Applies interview-style phrasing to a cleaned question.
pub fn apply_style(question: &str, style: InterviewStyle) -> String {
    apply_style_with(question, style, &mut rand::thread_rng())
}

/// [`apply_style`] with an explicit random source for the campus opener.
pub fn apply_style_with<R: Rng + ?Sized>(question: &str, style: InterviewStyle, rng: &mut R) -> String {
    match style {
        InterviewStyle::Formal => question.to_string(),
        InterviewStyle::Casual => {
            let lower = question.to_lowercase();
            let opens_plainly = ["can", "could", "would", "so,"]
                .iter()
                .any(|start| lower.starts_with(start));
            if !opens_plainly && (question.starts_with("What") || question.starts_with("How")) {
                format!("So, {}", lowercase_first(question))
            } else {
                question.to_string()
            }
        }
        InterviewStyle::Campus => {
            if CAMPUS_OPENERS.iter().any(|opener| question.starts_with(opener)) {
                return question.to_string();
            }
            let opener = CAMPUS_OPENERS.choose(rng).copied().unwrap_or("Great! ");
            format!("{opener}{}", lowercase_first(question))
        }
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Picks a template for `focus` and fills its placeholders from the answer.
pub fn fallback_question<R: Rng + ?Sized>(focus: FocusArea, answer: &str, rng: &mut R) -> String {
    let template = template_bank(focus)
        .choose(rng)
        .copied()
        .unwrap_or(DEFAULT_FOLLOW_UP);
    personalize(template, answer)
}

fn template_bank(focus: FocusArea) -> &'static [&'static str] {
    match focus {
        FocusArea::SpecificDetails => &[
            "Can you walk me through the specific steps you took in that {situation}?",
            "What exactly was your {role} in that {experience}?",
            "Could you give me more concrete details about how you approached that challenge?",
            "What specific actions did you take, and what was the {outcome}?",
            "Can you quantify the impact of your actions in that situation?",
        ],
        FocusArea::Leadership => &[
            "How did you motivate your team during that {experience}?",
            "What leadership approach did you take, and why?",
            "How did you handle any pushback or resistance from team members?",
            "What was the toughest leadership decision you had to make in that situation?",
            "How did you ensure everyone was aligned with your vision?",
        ],
        FocusArea::ProblemSolving => &[
            "What alternative solutions did you consider before settling on that approach?",
            "How did you identify the root cause of that problem?",
            "What resources or tools did you leverage to solve that challenge?",
            "How did you prioritize different aspects of the problem?",
            "Looking back, what would you do differently if faced with a similar problem?",
        ],
        FocusArea::Teamwork => &[
            "How did you ensure effective collaboration with your team members?",
            "What role did you naturally take in the team dynamic?",
            "How did you handle any conflicts or disagreements within the team?",
            "How did you adapt your communication style for different team members?",
            "What did you learn about yourself from working with that particular team?",
        ],
        FocusArea::ResultsImpact => &[
            "What was the measurable impact of your work on that project?",
            "How did stakeholders react to the results you delivered?",
            "What long-term effects did your solution have on the organization?",
            "How do you measure success in situations like that?",
            "What feedback did you receive about the {outcome} you achieved?",
        ],
        FocusArea::Challenges => &[
            "What was the biggest obstacle you encountered, and how did you overcome it?",
            "How did you maintain motivation when facing those difficulties?",
            "What support systems or resources did you tap into during tough times?",
            "How did that challenge change your perspective or approach?",
            "What resilience strategies did you develop from that {experience}?",
        ],
        FocusArea::Learning => &[
            "What key insights did you gain from that {experience}?",
            "How has that experience shaped your current professional approach?",
            "If you could go back, what would you do differently and why?",
            "What new skills or capabilities did you develop through that process?",
            "How do you apply those lessons in your current work environment?",
        ],
        FocusArea::Motivation | FocusArea::General => &[
            "Can you elaborate more on that particular aspect?",
            "What was the most significant challenge in that situation?",
            "How did that experience contribute to your professional growth?",
            "What was the key factor in your success with that project?",
            "How do you typically handle similar situations now?",
        ],
    }
}

/// Fills `{situation}`, `{experience}`, `{role}` and `{outcome}` by keyword.
fn personalize(template: &str, answer: &str) -> String {
    let answer = answer.to_lowercase();
    let situation = if answer.contains("team") {
        "team situation"
    } else if answer.contains("project") {
        "project"
    } else {
        "situation"
    };
    let experience = if answer.contains("challenge") {
        "challenging experience"
    } else {
        "experience"
    };
    let role = if answer.contains("lead") {
        "leadership role"
    } else {
        "role"
    };
    let outcome = if answer.contains("result") {
        "result"
    } else {
        "outcome"
    };

    template
        .replace("{situation}", situation)
        .replace("{experience}", experience)
        .replace("{role}", role)
        .replace("{outcome}", outcome)
}
