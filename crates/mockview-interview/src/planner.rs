// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer-quality analysis.
//!
//! The [`Planner`] records each answer in conversation memory, asks the chat
//! model for a structured assessment against the whole transcript, and
//! degrades to [`QualityAssessment::fallback`] when the model is unreachable
//! or its output cannot be repaired.

use std::sync::Arc;

use mockview_core::assessment::{DEFAULT_CONFIDENCE, FocusArea, MAX_LIST_ITEMS, QualityAssessment};
use mockview_core::traits::ProviderAdapter;
use mockview_core::MockviewError;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::gate::CallGate;
use crate::memory::ConversationMemory;
use crate::prompts::{ANALYSIS_SCHEMA, SamplingProfile, analysis_messages};
use crate::structured::{bounded_score, complete_structured, parse_model_json};

/// Assessment as the model returns it, before validation.
#[derive(Debug, Deserialize)]
struct RawAssessment {
    completeness_score: f64,
    specificity_score: f64,
    #[serde(default)]
    key_themes: Vec<String>,
    #[serde(default)]
    missing_elements: Vec<String>,
    #[serde(alias = "needs_followup")]
    needs_follow_up: bool,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    suggested_focus: String,
    #[serde(default)]
    conversation_context: String,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parses and validates model output into a [`QualityAssessment`].
///
/// Scores must round into 1..=10 and each list may hold at most three items.
pub fn parse_assessment(raw: &str) -> Result<QualityAssessment, MockviewError> {
    let parsed: RawAssessment = parse_model_json(raw)?;

    let completeness_score = bounded_score("completeness_score", parsed.completeness_score)?;
    let specificity_score = bounded_score("specificity_score", parsed.specificity_score)?;
    check_list("key_themes", &parsed.key_themes)?;
    check_list("missing_elements", &parsed.missing_elements)?;

    Ok(QualityAssessment {
        completeness_score,
        specificity_score,
        key_themes: parsed.key_themes,
        missing_elements: parsed.missing_elements,
        needs_follow_up: parsed.needs_follow_up,
        reasoning: parsed.reasoning,
        suggested_focus: FocusArea::parse_lenient(&parsed.suggested_focus),
        conversation_context: parsed.conversation_context,
        confidence: parsed
            .confidence
            .map(|c| c.clamp(0.0, 1.0) as f32)
            .unwrap_or(DEFAULT_CONFIDENCE),
    })
}

fn check_list(field: &str, items: &[String]) -> Result<(), MockviewError> {
    if items.len() > MAX_LIST_ITEMS {
        return Err(MockviewError::Schema {
            message: format!(
                "{field} may contain at most {MAX_LIST_ITEMS} items, got {}",
                items.len()
            ),
        });
    }
    Ok(())
}

/// Answer-quality analyzer.
pub struct Planner {
    provider: Arc<dyn ProviderAdapter>,
    gate: CallGate,
    memory: Arc<ConversationMemory>,
}

impl Planner {
    pub fn new(provider: Arc<dyn ProviderAdapter>, gate: CallGate, memory: Arc<ConversationMemory>) -> Self {
        Self {
            provider,
            gate,
            memory,
        }
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    /// Records the answer and assesses it against the full conversation.
    ///
    /// Never fails: any upstream error, timeout, or unrepairable output
    /// yields the fallback assessment. Memory grows by exactly one entry,
    /// and only once the assessment is complete.
    pub async fn analyze(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
        context: &str,
    ) -> QualityAssessment {
        let assessment = self.assess(session_id, question, answer, context).await;
        self.memory.append(session_id, question, answer);
        assessment
    }

    /// Assesses an answer as the next conversation round without recording it.
    ///
    /// Callers that mutate session state after further awaits record the
    /// round themselves once the turn commits.
    pub async fn assess(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
        context: &str,
    ) -> QualityAssessment {
        let transcript = self.memory.render_transcript_with(session_id, question, answer);
        debug!(session_id, round = self.memory.len(session_id) + 1, "analyzing answer quality");

        let request = SamplingProfile::ANALYSIS.request(
            analysis_messages(question, answer, &transcript, context),
            true,
        );

        match complete_structured(
            self.provider.as_ref(),
            &self.gate,
            self.gate.call_timeout(),
            request,
            ANALYSIS_SCHEMA,
            parse_assessment,
        )
        .await
        {
            Ok(assessment) => {
                info!(
                    session_id,
                    completeness = assessment.completeness_score,
                    specificity = assessment.specificity_score,
                    needs_follow_up = assessment.needs_follow_up,
                    focus = %assessment.suggested_focus,
                    "answer analyzed"
                );
                assessment
            }
            Err(e) => {
                warn!(session_id, error = %e, "answer analysis failed, using fallback assessment");
                QualityAssessment::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockview_core::types::ChatRole;
    use mockview_test_utils::MockChatModel;
    use std::time::Duration;

    const VAGUE: &str = r#"{
        "completeness_score": 3,
        "specificity_score": 2,
        "key_themes": ["teamwork"],
        "missing_elements": ["outcome", "specific actions"],
        "needs_followup": true,
        "reasoning": "Answer is vague",
        "suggested_focus": "specific details",
        "conversation_context": "Candidate is warming up",
        "confidence": 0.6
    }"#;

    fn planner(model: Arc<MockChatModel>, timeout: Duration) -> Planner {
        Planner::new(
            model,
            CallGate::new(4, timeout),
            Arc::new(ConversationMemory::new()),
        )
    }

    #[test]
    fn parses_model_output_with_alias_and_lenient_focus() {
        let assessment = parse_assessment(VAGUE).unwrap();
        assert_eq!(assessment.completeness_score, 3);
        assert!(assessment.needs_follow_up);
        assert_eq!(assessment.suggested_focus, FocusArea::SpecificDetails);
        assert_eq!(assessment.confidence, 0.6);
    }

    #[test]
    fn missing_confidence_defaults() {
        let raw = r#"{"completeness_score": 8, "specificity_score": 7.0, "needs_follow_up": false}"#;
        let assessment = parse_assessment(raw).unwrap();
        assert_eq!(assessment.specificity_score, 7);
        assert_eq!(assessment.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(assessment.suggested_focus, FocusArea::General);
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let raw = r#"{"completeness_score": 11, "specificity_score": 5, "needs_followup": false}"#;
        assert!(matches!(parse_assessment(raw), Err(MockviewError::Schema { .. })));
        let raw = r#"{"completeness_score": 0, "specificity_score": 5, "needs_followup": false}"#;
        assert!(parse_assessment(raw).is_err());
    }

    #[test]
    fn too_many_themes_is_rejected() {
        let raw = r#"{"completeness_score": 5, "specificity_score": 5, "needs_followup": false,
                      "key_themes": ["a", "b", "c", "d"]}"#;
        let err = parse_assessment(raw).unwrap_err();
        assert!(err.to_string().contains("key_themes"));
    }

    #[tokio::test]
    async fn analyze_records_memory_and_sends_transcript() {
        let model = Arc::new(MockChatModel::with_responses(vec![VAGUE.into()]));
        let planner = planner(model.clone(), Duration::from_secs(1));

        let assessment = planner
            .analyze("s1", "Tell me about a project", "We did stuff.", "")
            .await;
        assert_eq!(assessment.specificity_score, 2);
        assert_eq!(planner.memory().len("s1"), 1);

        let request = model.requests().pop().unwrap();
        assert!(request.json_output);
        assert_eq!(request.max_tokens, 1500);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert!(request.messages[1].content.contains("Conversation round 1:"));
    }

    #[tokio::test]
    async fn assess_leaves_memory_untouched() {
        let model = Arc::new(MockChatModel::with_responses(vec![VAGUE.into()]));
        let planner = planner(model.clone(), Duration::from_secs(1));
        planner.memory().append("s1", "Intro?", "I write databases.");

        planner.assess("s1", "Why?", "Latency.", "").await;
        assert_eq!(planner.memory().len("s1"), 1);
        let request = model.requests().pop().unwrap();
        assert!(request.messages[1].content.contains("Conversation round 2:"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_analysis_records_nothing() {
        let model = Arc::new(
            MockChatModel::with_responses(vec![VAGUE.into()]).with_delay(Duration::from_secs(5)),
        );
        let planner = planner(model, Duration::from_secs(30));

        let analysis = planner.analyze("s1", "Q", "A", "");
        assert!(tokio::time::timeout(Duration::from_secs(1), analysis).await.is_err());
        assert!(planner.memory().is_empty("s1"));
    }

    #[tokio::test]
    async fn unrepairable_output_falls_back() {
        let model = Arc::new(MockChatModel::with_responses(vec![
            "I think it was fine".into(),
            "{\"still\": \"wrong\"}".into(),
        ]));
        let planner = planner(model.clone(), Duration::from_secs(1));

        let assessment = planner.analyze("s1", "Q", "A", "").await;
        assert_eq!(assessment, QualityAssessment::fallback());
        assert_eq!(model.call_count(), 2);
        assert_eq!(planner.memory().len("s1"), 1);
    }

    #[tokio::test]
    async fn repaired_output_is_used() {
        let model = Arc::new(MockChatModel::with_responses(vec![
            "```json\n{\"completeness_score\": 42}\n```".into(),
            VAGUE.into(),
        ]));
        let planner = planner(model, Duration::from_secs(1));
        let assessment = planner.analyze("s1", "Q", "A", "").await;
        assert_eq!(assessment.completeness_score, 3);
    }

    #[tokio::test]
    async fn provider_error_falls_back() {
        let model = Arc::new(MockChatModel::failing());
        let planner = planner(model, Duration::from_secs(1));
        let assessment = planner.analyze("s1", "Q", "A", "").await;
        assert!(!assessment.needs_follow_up);
        assert_eq!(assessment.reasoning, "System error, unable to analyze");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_falls_back() {
        let model = Arc::new(
            MockChatModel::with_responses(vec![VAGUE.into()]).with_delay(Duration::from_secs(60)),
        );
        let planner = planner(model, Duration::from_millis(100));
        let assessment = planner.analyze("s1", "Q", "A", "").await;
        assert_eq!(assessment, QualityAssessment::fallback());
    }
}
