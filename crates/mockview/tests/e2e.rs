// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete interview pipeline.
//!
//! Each test builds an isolated TestHarness with mock adapters and a temp
//! reports directory. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use mockview_core::MockviewError;
use mockview_core::assessment::FollowUpStrategy;
use mockview_core::types::{AudioFormat, TranscriptionResponse};
use mockview_gateway::{ConnectionManager, GatewayState, build_router};
use mockview_interview::{CLOSING_MESSAGE, TurnAction, TurnInput};
use mockview_test_utils::TestHarness;

const VAGUE: &str = r#"{
    "completeness_score": 2,
    "specificity_score": 2,
    "key_themes": [],
    "missing_elements": ["examples", "outcome"],
    "needs_followup": true,
    "reasoning": "The answer gives no detail.",
    "suggested_focus": "specific details",
    "conversation_context": "",
    "confidence": 0.7
}"#;

const SOLID: &str = r#"{
    "completeness_score": 8,
    "specificity_score": 8,
    "key_themes": ["ownership"],
    "missing_elements": [],
    "needs_follow_up": false,
    "reasoning": "Concrete and complete.",
    "suggested_focus": "general",
    "confidence": 0.9
}"#;

const REPORT: &str = r#"{
    "overall_score": 6,
    "overall_summary": "Answers were brief and needed prompting.",
    "skill_assessments": [
        {"skill_name": "Communication", "score": 5, "evidence": ["short answers"], "improvement_suggestions": ["use STAR"]}
    ],
    "strengths": ["Honest"],
    "areas_for_improvement": ["Detail"],
    "behavioral_insights": ["Reserved"],
    "question_performance": [],
    "hiring_recommendation": "neutral",
    "next_steps": ["Practice with examples"],
    "response_quality_avg": 4.5
}"#;

// ---- Three vague answers ----

#[tokio::test]
async fn three_vague_answers_each_get_one_follow_up() {
    let mut responses = Vec::new();
    for _ in 0..3 {
        responses.push(VAGUE.to_string());
        responses.push("Can you give me a concrete example.".to_string());
        responses.push(VAGUE.to_string());
    }
    let harness = TestHarness::builder()
        .with_mock_responses(responses)
        .build()
        .unwrap();
    let sid = harness.start().await;

    for (index, answer) in ["yes", "it was fine", "I don't know"].into_iter().enumerate() {
        let first = harness.answer(&sid, answer).await.unwrap();
        assert_eq!(first.action, TurnAction::FollowUp, "question {index}");
        assert_eq!(first.ai_response, "Can you give me a concrete example?");
        assert_eq!(first.strategy, Some(FollowUpStrategy::DeepDive));
        assert_eq!(first.question_index, index);
        assert_eq!(first.follow_up_count, 1);

        // The follow-up budget is spent, so even a vague reply advances.
        let second = harness.answer(&sid, answer).await.unwrap();
        assert_eq!(second.follow_up_count, 0);
        if index < 2 {
            assert_eq!(second.action, TurnAction::NextQuestion);
            assert_eq!(second.question_index, index + 1);
        } else {
            assert_eq!(second.action, TurnAction::InterviewCompleted);
            assert!(second.completed);
        }
    }
    assert_eq!(harness.chat.call_count(), 9);

    // Anything after completion is answered locally.
    let after = harness.answer(&sid, "hello?").await.unwrap();
    assert_eq!(after.action, TurnAction::InterviewCompleted);
    assert_eq!(after.ai_response, CLOSING_MESSAGE);
    assert_eq!(harness.chat.call_count(), 9);

    let status = harness.coordinator.status(&sid).await.unwrap();
    assert_eq!(status.total_interactions, 6);
    assert_eq!(status.analyzed_answers, 6);

    // Six answers, but only three main questions.
    let saved = harness.coordinator.generate_report(&sid, None).await.unwrap();
    assert_eq!(saved.report.total_questions, 3);
    assert_eq!(saved.report.follow_up_questions, 3);
}

#[tokio::test]
async fn solid_answers_advance_without_follow_ups() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![SOLID.into(), SOLID.into(), SOLID.into()])
        .build()
        .unwrap();
    let sid = harness.start().await;

    let mut actions = Vec::new();
    for answer in [
        "I am a backend engineer with six years of Rust and Go.",
        "I cut p99 latency by 40% by redesigning our cache layer.",
        "I want to work on infrastructure that many teams depend on.",
    ] {
        let outcome = harness.answer(&sid, answer).await.unwrap();
        assert!(outcome.strategy.is_none());
        actions.push(outcome.action);
    }
    assert_eq!(
        actions,
        vec![
            TurnAction::NextQuestion,
            TurnAction::NextQuestion,
            TurnAction::InterviewCompleted
        ]
    );
    // One analysis call per answer, no generation calls.
    assert_eq!(harness.chat.call_count(), 3);
}

// ---- Audio ----

#[tokio::test]
async fn audio_answer_is_transcribed_then_analyzed() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![SOLID.into()])
        .with_transcripts(vec![TranscriptionResponse {
            text: "I led the migration to Kubernetes.".into(),
            language: Some("en".into()),
            duration_secs: Some(4.0),
            segments: Vec::new(),
        }])
        .build()
        .unwrap();
    let sid = harness.start().await;

    let outcome = harness
        .coordinator
        .process_turn(&sid, TurnInput::audio(vec![1u8; 256], AudioFormat::Webm))
        .await
        .unwrap();
    assert_eq!(outcome.user_input, "I led the migration to Kubernetes.");
    let transcription = outcome.transcription.unwrap();
    assert!((0.0..=1.0).contains(&transcription.confidence));

    let analysis = harness.chat.requests().remove(0);
    assert!(
        analysis
            .messages
            .iter()
            .any(|m| m.content.contains("I led the migration to Kubernetes."))
    );
}

// ---- Fallbacks ----

#[tokio::test]
async fn slow_model_falls_back_and_interview_continues() {
    let harness = TestHarness::builder()
        .with_chat_delay(Duration::from_secs(5))
        .with_call_timeout(1)
        .build()
        .unwrap();
    let sid = harness.start().await;

    let outcome = harness.answer(&sid, "I did some things.").await.unwrap();
    // The fallback assessment never asks for a follow-up.
    assert_eq!(outcome.action, TurnAction::NextQuestion);
    assert_eq!(outcome.question_index, 1);
}

#[tokio::test]
async fn failing_model_still_produces_report() {
    let harness = TestHarness::builder().with_failing_chat().build().unwrap();
    let sid = harness.start().await;
    harness.answer(&sid, "I write compilers.").await.unwrap();

    let saved = harness
        .coordinator
        .generate_report(&sid, Some("Grace Hopper"))
        .await
        .unwrap();
    assert!(saved.report.overall_summary.contains("Manual review recommended"));
    assert!(saved.json_path.exists());
    assert!(saved.summary_path.exists());
}

// ---- Reports ----

#[tokio::test]
async fn report_requires_history() {
    let harness = TestHarness::builder().build().unwrap();
    let sid = harness.start().await;

    let err = harness.coordinator.generate_report(&sid, None).await.unwrap_err();
    assert!(matches!(err, MockviewError::NoHistory(_)));
    assert_eq!(harness.chat.call_count(), 0);
}

#[tokio::test]
async fn full_interview_report_is_persisted() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            VAGUE.into(),
            "What exactly did you build.".into(),
            SOLID.into(),
            REPORT.into(),
        ])
        .with_max_questions(1)
        .build()
        .unwrap();
    let sid = harness.start().await;

    harness.answer(&sid, "stuff").await.unwrap();
    let done = harness.answer(&sid, "A rate limiter in Rust.").await.unwrap();
    assert!(done.completed);

    let saved = harness
        .coordinator
        .generate_report(&sid, Some("Ada Lovelace"))
        .await
        .unwrap();
    assert_eq!(saved.report.overall_score, 6);
    // One main question, answered twice because of its follow-up.
    assert_eq!(saved.report.total_questions, 1);
    assert_eq!(saved.report.follow_up_questions, 1);

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&saved.json_path).unwrap()).unwrap();
    assert_eq!(json["candidate_name"], "Ada Lovelace");
    assert_eq!(json["hiring_recommendation"], "neutral");
    let summary = std::fs::read_to_string(&saved.summary_path).unwrap();
    assert!(summary.contains("Ada Lovelace"));
}

// ---- Concurrency ----

#[tokio::test]
async fn overlapping_turns_for_one_session_are_rejected() {
    let harness = TestHarness::builder()
        .with_chat_delay(Duration::from_millis(300))
        .with_mock_responses(vec![SOLID.into()])
        .build()
        .unwrap();
    let sid = harness.start().await;

    let coordinator = harness.coordinator.clone();
    let first_sid = sid.clone();
    let first = tokio::spawn(async move {
        coordinator
            .process_turn(&first_sid, TurnInput::text("first answer"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = harness.answer(&sid, "second answer").await.unwrap_err();
    assert!(matches!(second, MockviewError::TurnInProgress(_)));
    assert!(first.await.unwrap().is_ok());
}

#[tokio::test]
async fn reset_waits_for_running_turn() {
    let harness = TestHarness::builder()
        .with_transcription_delay(Duration::from_millis(200))
        .with_mock_responses(vec![SOLID.into()])
        .build()
        .unwrap();
    let sid = harness.start().await;

    let coordinator = harness.coordinator.clone();
    let turn_sid = sid.clone();
    let turn = tokio::spawn(async move {
        coordinator
            .process_turn(&turn_sid, TurnInput::audio(vec![1u8; 64], AudioFormat::Wav))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = harness.coordinator.reset(&sid).unwrap_err();
    assert!(matches!(err, MockviewError::TurnInProgress(_)));
    turn.await.unwrap().unwrap();

    let status = harness.coordinator.status(&sid).await.unwrap();
    assert_eq!(status.analyzed_answers, 1);
    assert_eq!(status.responses, 1);

    // Once idle the reset goes through and a new session under the same id starts clean.
    harness.coordinator.reset(&sid).unwrap();
    harness.coordinator.start(Some(sid.as_str()), None).await;
    let status = harness.coordinator.status(&sid).await.unwrap();
    assert_eq!(status.analyzed_answers, 0);
    assert_eq!(status.responses, 0);
}

#[tokio::test]
async fn aborted_turn_leaves_session_unchanged() {
    let harness = TestHarness::builder()
        .with_chat_delay(Duration::from_millis(200))
        .with_mock_responses(vec![SOLID.into(), SOLID.into()])
        .build()
        .unwrap();
    let sid = harness.start().await;

    let coordinator = harness.coordinator.clone();
    let turn_sid = sid.clone();
    let turn = tokio::spawn(async move {
        coordinator
            .process_turn(&turn_sid, TurnInput::text("an answer cut short"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    turn.abort();
    assert!(turn.await.unwrap_err().is_cancelled());

    let status = harness.coordinator.status(&sid).await.unwrap();
    assert_eq!(status.analyzed_answers, 0);
    assert_eq!(status.responses, 0);
    assert_eq!(status.question_index, 0);

    let outcome = harness.answer(&sid, "I rebuilt our deploy pipeline.").await.unwrap();
    assert_eq!(outcome.action, TurnAction::NextQuestion);
    let status = harness.coordinator.status(&sid).await.unwrap();
    assert_eq!(status.analyzed_answers, status.responses);
}

// ---- HTTP surface ----

#[tokio::test]
async fn http_interview_round_trip() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![SOLID.into()])
        .build()
        .unwrap();
    let state = GatewayState::new(
        harness.coordinator.clone(),
        Arc::new(ConnectionManager::new()),
        &harness.config,
    );
    let app = build_router(state, &harness.config.server.allowed_origins);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/interview/start")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"session_id":"e2e-http"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/interview/e2e-http/answer")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"answer":"I maintain a database engine."}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["action"], "next_question");
    assert_eq!(body["data"]["input_type"], "text");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/interview/e2e-http/question")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["question_index"], 1);
}
