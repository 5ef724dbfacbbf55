// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction and sampling profiles.
//!
//! Wording here is not a contract; only the JSON shapes requested from the
//! model are, and those are enforced by the parsers in `planner` and
//! `report`.

use mockview_core::assessment::{FollowUpStrategy, QualityAssessment};
use mockview_core::types::{ChatMessage, ChatRequest, InterviewStyle};

/// Temperature and token cap for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingProfile {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SamplingProfile {
    /// Answer analysis.
    pub const ANALYSIS: Self = Self {
        temperature: 0.3,
        max_tokens: 1500,
    };
    /// Deep-dive follow-ups.
    pub const ANALYTICAL: Self = Self {
        temperature: 0.3,
        max_tokens: 150,
    };
    /// Behavioral and situational follow-ups.
    pub const BALANCED: Self = Self {
        temperature: 0.7,
        max_tokens: 150,
    };
    /// Reflection follow-ups.
    pub const CREATIVE: Self = Self {
        temperature: 0.8,
        max_tokens: 150,
    };
    /// Interview reports.
    pub const REPORT: Self = Self {
        temperature: 0.3,
        max_tokens: 1500,
    };

    /// Profile used by the follow-up template for `strategy`.
    pub fn for_strategy(strategy: FollowUpStrategy) -> Self {
        match strategy {
            FollowUpStrategy::DeepDive => Self::ANALYTICAL,
            FollowUpStrategy::Behavioral | FollowUpStrategy::Situational => Self::BALANCED,
            FollowUpStrategy::Reflection => Self::CREATIVE,
        }
    }

    /// Builds a request with this profile.
    pub fn request(self, messages: Vec<ChatMessage>, json_output: bool) -> ChatRequest {
        ChatRequest {
            model: None,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_output,
        }
    }
}

const ANALYST_SYSTEM: &str = "You are an expert interview analyst. You assess candidate answers \
for completeness, specificity and structure, identify key themes and missing information, and \
recommend where a follow-up question should focus. Always respond in English and always respond \
with a single JSON object.";

const INTERVIEWER_SYSTEM: &str = "You are a professional interviewer. Generate exactly one \
thoughtful follow-up question in English based on the candidate's answer. Keep it conversational, \
avoid yes/no questions, build on what the candidate already shared, and never repeat a question \
already asked in this interview. Reply with the question only.";

/// Schema description sent with analysis requests and repair calls.
pub const ANALYSIS_SCHEMA: &str = r#"{
  "completeness_score": integer 1-10,
  "specificity_score": integer 1-10,
  "key_themes": [string] (at most 3),
  "missing_elements": [string] (at most 3),
  "needs_followup": boolean,
  "reasoning": string,
  "suggested_focus": one of "specific_details", "leadership", "problem_solving", "teamwork", "results_impact", "challenges", "learning", "motivation", "general",
  "conversation_context": string,
  "confidence": number 0-1
}"#;

/// Schema description sent with report requests and repair calls.
pub const REPORT_SCHEMA: &str = r#"{
  "overall_score": integer 1-10,
  "overall_summary": string,
  "skill_assessments": [{"skill_name": string, "score": integer 1-10, "evidence": [string], "improvement_suggestions": [string]}],
  "strengths": [string],
  "areas_for_improvement": [string],
  "behavioral_insights": [string],
  "question_performance": [object],
  "hiring_recommendation": one of "strongly_recommend", "recommend", "neutral", "not_recommend",
  "next_steps": [string],
  "response_quality_avg": number
}"#;

/// Messages for the answer-quality analysis call.
pub fn analysis_messages(
    question: &str,
    answer: &str,
    transcript: &str,
    context: &str,
) -> Vec<ChatMessage> {
    let context = if context.trim().is_empty() {
        "No previous conversation"
    } else {
        context
    };

    let prompt = format!(
        "Analyze the quality of the candidate's answer using the full conversation history.\n\n\
         Current question: {question}\n\
         Candidate answer: {answer}\n\n\
         Conversation history:\n{transcript}\n\n\
         Additional context: {context}\n\n\
         Score completeness (does it fully address the question) and specificity (concrete \
         examples, numbers, details) from 1 to 10. List at most 3 key themes and at most 3 \
         missing elements. A complete and specific answer (completeness >= 7, specificity >= 6) \
         usually needs no follow-up; a vague answer whose gaps were not covered earlier does. \
         Do not recommend probing topics the history already covers. Summarize the interview's \
         progress in conversation_context.\n\n\
         Return JSON with this structure:\n{ANALYSIS_SCHEMA}"
    );

    vec![ChatMessage::system(ANALYST_SYSTEM), ChatMessage::user(prompt)]
}

/// Inputs shared by every follow-up template.
#[derive(Debug, Clone, Copy)]
pub struct FollowUpPrompt<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub context: &'a str,
    pub style: InterviewStyle,
    pub assessment: &'a QualityAssessment,
}

/// Messages for a follow-up generation call using the template for `strategy`.
pub fn follow_up_messages(strategy: FollowUpStrategy, input: &FollowUpPrompt<'_>) -> Vec<ChatMessage> {
    let FollowUpPrompt {
        question,
        answer,
        context,
        style,
        assessment,
    } = *input;
    let focus = assessment.suggested_focus;
    let themes = assessment.key_themes.join(", ");

    let body = match strategy {
        FollowUpStrategy::DeepDive => format!(
            "Generate a deep-dive follow-up question.\n\n\
             Candidate answer: {answer}\nOriginal question: {question}\n\
             Conversation background: {context}\nFocus: {focus}\nKey themes: {themes}\n\n\
             Dig into the specific experience the candidate mentioned and ask for concrete \
             details, numbers or examples."
        ),
        FollowUpStrategy::Behavioral => format!(
            "Generate a follow-up question about the candidate's behavior and decision-making.\n\n\
             Candidate answer: {answer}\nOriginal question: {question}\n\
             Conversation background: {context}\nFocus: {focus}\n\n\
             Explore how they decided, what role they played in the team, and how they reacted \
             to obstacles."
        ),
        FollowUpStrategy::Reflection => format!(
            "Generate a follow-up question about reflection and learning.\n\n\
             Candidate answer: {answer}\nExperience type: {focus}\n\
             Conversation background: {context}\n\n\
             Ask what they learned, how they would apply it, or what they would do differently."
        ),
        FollowUpStrategy::Situational => format!(
            "Generate a follow-up question about similar or related situations.\n\n\
             Candidate's experience: {answer}\nKey themes: {themes}\n\
             Conversation background: {context}\n\n\
             Ask how the same skills played out in a different context. Avoid topics already \
             discussed."
        ),
    };

    let prompt = format!(
        "{body}\n\nTone: {}.\n\n{}\nFollow-up question:",
        style_tone(style),
        few_shot(strategy)
    );

    vec![ChatMessage::system(INTERVIEWER_SYSTEM), ChatMessage::user(prompt)]
}

fn style_tone(style: InterviewStyle) -> &'static str {
    match style {
        InterviewStyle::Formal => "formal and professional",
        InterviewStyle::Casual => "relaxed and conversational",
        InterviewStyle::Campus => "warm and encouraging, suited to a student or new graduate",
    }
}

fn few_shot(strategy: FollowUpStrategy) -> &'static str {
    match strategy {
        FollowUpStrategy::DeepDive => {
            "Example:\nAnswer: I managed a project team and delivered on time.\n\
             Question: Can you walk me through the specific strategies you used to keep the \
             project on track, and what got in the way?\n"
        }
        FollowUpStrategy::Behavioral => {
            "Example:\nAnswer: I had to make a difficult call about resource allocation.\n\
             Question: What criteria did you use to make that decision, and how did you explain \
             it to your team?\n"
        }
        FollowUpStrategy::Reflection | FollowUpStrategy::Situational => "",
    }
}

/// Messages for the end-of-interview report call.
pub fn report_messages(
    candidate_name: &str,
    duration_minutes: f64,
    rounds: usize,
    transcript: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        "Write a detailed interview report from the complete conversation history.\n\n\
         Candidate: {candidate_name}\nInterview duration: {duration_minutes:.1} minutes\n\
         Conversation rounds: {rounds}\n\n\
         Conversation history:\n{transcript}\n\n\
         Include an overall score (1-10) with a summary; skill scores (1-10) with evidence for \
         communication, problem solving, teamwork, leadership and learning ability; 3-5 \
         strengths; 2-4 areas for improvement; 2-3 behavioral insights; notes on each main \
         question; a hiring recommendation with next steps; and the average answer quality. \
         Base every statement on the conversation itself.\n\n\
         Return JSON with this structure:\n{REPORT_SCHEMA}"
    );

    vec![ChatMessage::system(ANALYST_SYSTEM), ChatMessage::user(prompt)]
}

/// Messages asking the model to fix output that failed to parse.
pub fn repair_messages(schema: &str, raw_output: &str, problem: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        "The output below does not match the required JSON structure ({problem}).\n\n\
         Required structure:\n{schema}\n\nOutput:\n{raw_output}\n\n\
         Return only the corrected JSON object."
    );
    vec![
        ChatMessage::system("You repair malformed JSON so it matches a required structure."),
        ChatMessage::user(prompt),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockview_core::types::ChatRole;

    #[test]
    fn strategy_profiles() {
        assert_eq!(
            SamplingProfile::for_strategy(FollowUpStrategy::DeepDive),
            SamplingProfile::ANALYTICAL
        );
        assert_eq!(
            SamplingProfile::for_strategy(FollowUpStrategy::Behavioral).temperature,
            0.7
        );
        assert_eq!(
            SamplingProfile::for_strategy(FollowUpStrategy::Reflection).temperature,
            0.8
        );
        assert_eq!(
            SamplingProfile::for_strategy(FollowUpStrategy::Situational),
            SamplingProfile::BALANCED
        );
        assert_eq!(SamplingProfile::ANALYSIS.max_tokens, 1500);
    }

    #[test]
    fn analysis_prompt_embeds_transcript_and_default_context() {
        let messages = analysis_messages("Q?", "An answer", "Conversation round 1:", "");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        let user = &messages[1].content;
        assert!(user.contains("Candidate answer: An answer"));
        assert!(user.contains("Conversation round 1:"));
        assert!(user.contains("No previous conversation"));
        assert!(user.contains("completeness_score"));
    }

    #[test]
    fn follow_up_prompt_reflects_style_and_focus() {
        let mut assessment = QualityAssessment::fallback();
        assessment.key_themes = vec!["leadership".into(), "delivery".into()];
        let input = FollowUpPrompt {
            question: "Tell me about a project",
            answer: "I led it.",
            context: "",
            style: InterviewStyle::Campus,
            assessment: &assessment,
        };

        let messages = follow_up_messages(FollowUpStrategy::Situational, &input);
        let user = &messages[1].content;
        assert!(user.contains("leadership, delivery"));
        assert!(user.contains("encouraging"));
        assert!(user.ends_with("Follow-up question:"));
    }

    #[test]
    fn request_uses_profile() {
        let request = SamplingProfile::REPORT.request(vec![ChatMessage::user("x")], true);
        assert!(request.json_output);
        assert_eq!(request.max_tokens, 1500);
        assert!(request.model.is_none());
    }
}
