// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn controller.
//!
//! The [`Coordinator`] owns the session store and drives each candidate turn
//! through the pipeline: optional transcription, answer analysis, then either
//! a single follow-up or an advance to the next main question. It also serves
//! the manual operations exposed over HTTP and end-of-interview reports.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use mockview_config::model::MockviewConfig;
use mockview_core::assessment::{FocusArea, FollowUpStrategy, QualityAssessment};
use mockview_core::traits::{ProviderAdapter, TranscriptionAdapter};
use mockview_core::types::{AudioFormat, HealthStatus, InputType, InterviewStyle};
use mockview_core::MockviewError;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::chatbot::{Chatbot, FollowUp, GenerationMethod};
use crate::gate::CallGate;
use crate::memory::ConversationMemory;
use crate::planner::Planner;
use crate::prompts::FollowUpPrompt;
use crate::questions::{InterviewQuestion, QuestionSource};
use crate::recognizer::{Recognizer, Transcription};
use crate::report::{ANONYMOUS, ReportGenerator, ReportRequest, ReportWriter, SavedReport};
use crate::session::{Interaction, ResponseEntry, Session, SessionHandle, SessionStore};

/// Sent once every main question has been covered.
pub const CLOSING_MESSAGE: &str =
    "Thank you for completing the interview! All questions have been covered.";

/// Confidence reported when the reply is a main question rather than a follow-up.
pub const MAIN_QUESTION_CONFIDENCE: f32 = 0.9;

/// Interactions included as context when the caller supplies none.
const CONTEXT_TURNS: usize = 3;

/// Answer payload of a turn.
#[derive(Debug, Clone)]
pub enum TurnContent {
    Text(String),
    Audio { bytes: Vec<u8>, format: AudioFormat },
}

/// One candidate submission.
#[derive(Debug, Clone)]
pub struct TurnInput {
    pub content: TurnContent,
    /// Caller-supplied context; recent interactions are used when absent.
    pub context: Option<String>,
}

impl TurnInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: TurnContent::Text(text.into()),
            context: None,
        }
    }

    pub fn audio(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self {
            content: TurnContent::Audio { bytes, format },
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn input_type(&self) -> InputType {
        match self.content {
            TurnContent::Text(_) => InputType::Text,
            TurnContent::Audio { .. } => InputType::Audio,
        }
    }
}

/// What the interviewer does after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    #[serde(rename = "followup")]
    FollowUp,
    NextQuestion,
    InterviewCompleted,
}

/// Client-facing digest of a [`QualityAssessment`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub completeness_score: u8,
    pub specificity_score: u8,
    pub needs_follow_up: bool,
    pub suggested_focus: FocusArea,
    /// Strategy a follow-up for this answer would use.
    pub recommended_strategy: FollowUpStrategy,
    pub key_themes: Vec<String>,
    pub missing_elements: Vec<String>,
    pub reasoning: String,
}

impl From<&QualityAssessment> for AnalysisSummary {
    fn from(assessment: &QualityAssessment) -> Self {
        Self {
            completeness_score: assessment.completeness_score,
            specificity_score: assessment.specificity_score,
            needs_follow_up: assessment.needs_follow_up,
            suggested_focus: assessment.suggested_focus,
            recommended_strategy: assessment.recommended_strategy(),
            key_themes: assessment.key_themes.clone(),
            missing_elements: assessment.missing_elements.clone(),
            reasoning: assessment.reasoning.clone(),
        }
    }
}

/// Result of [`Coordinator::process_turn`].
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub session_id: String,
    pub input_type: InputType,
    pub user_input: String,
    pub ai_response: String,
    pub action: TurnAction,
    pub strategy: Option<FollowUpStrategy>,
    pub focus_area: Option<FocusArea>,
    pub confidence: f32,
    pub processing_time_ms: u64,
    pub question_index: usize,
    pub total_questions: usize,
    pub follow_up_count: u8,
    pub total_interactions: u32,
    pub completed: bool,
    pub analysis_summary: Option<AnalysisSummary>,
    pub transcription: Option<Transcription>,
}

/// Snapshot of a session's progress.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewStatus {
    pub session_id: String,
    pub style: InterviewStyle,
    pub phase: String,
    pub question_index: usize,
    pub total_questions: usize,
    pub follow_up_count: u8,
    pub total_interactions: u32,
    pub responses: usize,
    pub analyzed_answers: usize,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub duration_minutes: f64,
}

/// Result of [`Coordinator::start`].
#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub session_id: String,
    pub style: InterviewStyle,
    pub question: Option<InterviewQuestion>,
    pub question_index: usize,
    pub total_questions: usize,
    /// The id was already live, so the existing session was returned.
    pub resumed: bool,
}

/// Result of [`Coordinator::current_question`].
#[derive(Debug, Clone, Serialize)]
pub struct CurrentQuestion {
    pub session_id: String,
    pub question_index: usize,
    pub total_questions: usize,
    pub question: Option<InterviewQuestion>,
    /// Pending follow-up for the current question, if one was asked.
    pub follow_up: Option<String>,
    pub completed: bool,
}

/// Result of [`Coordinator::request_follow_up`].
#[derive(Debug, Clone, Serialize)]
pub struct ManualFollowUp {
    pub session_id: String,
    pub question: String,
    pub strategy: FollowUpStrategy,
    pub method: GenerationMethod,
    pub confidence: f32,
    pub follow_up_count: u8,
    pub analysis_summary: AnalysisSummary,
}

/// Result of [`Coordinator::advance`].
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceOutcome {
    pub session_id: String,
    pub question_index: usize,
    pub total_questions: usize,
    pub question: Option<InterviewQuestion>,
    pub completed: bool,
}

/// Health of one upstream adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn from_check(name: &str, check: Result<HealthStatus, MockviewError>) -> Self {
        let (healthy, detail) = match check {
            Ok(HealthStatus::Healthy) => (true, None),
            Ok(HealthStatus::Degraded(reason)) => (true, Some(reason)),
            Ok(HealthStatus::Unhealthy(reason)) => (false, Some(reason)),
            Err(e) => (false, Some(e.to_string())),
        };
        Self {
            name: name.to_string(),
            healthy,
            detail,
        }
    }
}

/// Health of the chat and transcription adapters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderHealth {
    pub chat: ComponentHealth,
    pub transcription: ComponentHealth,
}

impl ProviderHealth {
    pub fn is_healthy(&self) -> bool {
        self.chat.healthy && self.transcription.healthy
    }
}

/// Interview turn controller.
pub struct Coordinator {
    chat: Arc<dyn ProviderAdapter>,
    transcriber: Arc<dyn TranscriptionAdapter>,
    questions: Arc<dyn QuestionSource>,
    store: Arc<SessionStore>,
    recognizer: Recognizer,
    planner: Planner,
    chatbot: Chatbot,
    reports: ReportGenerator,
    writer: ReportWriter,
    report_timeout: Duration,
    default_style: InterviewStyle,
}

impl Coordinator {
    pub fn new(
        chat: Arc<dyn ProviderAdapter>,
        transcriber: Arc<dyn TranscriptionAdapter>,
        questions: Arc<dyn QuestionSource>,
        config: &MockviewConfig,
    ) -> Self {
        let memory = Arc::new(ConversationMemory::new());
        let store = Arc::new(SessionStore::new(memory.clone()));
        let gate = CallGate::from_config(&config.limits);
        let report_timeout = Duration::from_secs(config.limits.report_timeout_secs);

        let default_style = config
            .interview
            .default_style
            .parse::<InterviewStyle>()
            .unwrap_or_else(|_| {
                warn!(
                    style = %config.interview.default_style,
                    "unknown default interview style, using formal"
                );
                InterviewStyle::default()
            });

        info!(
            questions = questions.len(),
            max_concurrent_calls = config.limits.max_concurrent_calls,
            %default_style,
            chat_model = %config.openai.chat_model,
            transcription_model = %config.openai.transcription_model,
            reports = %config.reports.output_dir,
            "interview coordinator ready"
        );

        Self {
            recognizer: Recognizer::new(transcriber.clone(), gate.clone(), &config.audio),
            planner: Planner::new(chat.clone(), gate.clone(), memory.clone()),
            chatbot: Chatbot::new(chat.clone(), gate.clone()),
            reports: ReportGenerator::new(chat.clone(), gate, memory, report_timeout),
            writer: ReportWriter::new(&config.reports.output_dir),
            chat,
            transcriber,
            questions,
            store,
            report_timeout,
            default_style,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn recognizer(&self) -> &Recognizer {
        &self.recognizer
    }

    pub fn default_style(&self) -> InterviewStyle {
        self.default_style
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Runs both adapter health checks concurrently.
    pub async fn provider_health(&self) -> ProviderHealth {
        let (chat, transcription) =
            tokio::join!(self.chat.health_check(), self.transcriber.health_check());
        ProviderHealth {
            chat: ComponentHealth::from_check(self.chat.name(), chat),
            transcription: ComponentHealth::from_check(self.transcriber.name(), transcription),
        }
    }

    /// Creates a session (or returns the live one with the same id) and the first question.
    pub async fn start(
        &self,
        session_id: Option<&str>,
        style: Option<InterviewStyle>,
    ) -> StartedInterview {
        let resumed = session_id.is_some_and(|id| self.store.contains(id));
        let (id, handle) = self
            .store
            .create(session_id, style.unwrap_or(self.default_style));

        let mut session = handle.lock().await;
        session.touch();
        StartedInterview {
            session_id: id,
            style: session.style,
            question: self.questions.question(session.question_index).cloned(),
            question_index: session.question_index,
            total_questions: self.questions.len(),
            resumed,
        }
    }

    pub async fn status(&self, session_id: &str) -> Result<InterviewStatus, MockviewError> {
        let handle = self.handle(session_id)?;
        let session = handle.lock().await;
        Ok(self.snapshot(&session))
    }

    pub async fn current_question(&self, session_id: &str) -> Result<CurrentQuestion, MockviewError> {
        let handle = self.handle(session_id)?;
        let session = handle.lock().await;
        Ok(CurrentQuestion {
            session_id: session.id.clone(),
            question_index: session.question_index,
            total_questions: self.questions.len(),
            question: self.current(&session).cloned(),
            follow_up: pending_follow_up(&session).map(str::to_string),
            completed: session.completed,
        })
    }

    /// Transcribes audio for an existing session without taking a turn.
    pub async fn transcribe(
        &self,
        session_id: &str,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> Result<Transcription, MockviewError> {
        self.handle(session_id)?;
        let transcription = self.recognizer.transcribe(audio, format).await?;
        self.store.touch(session_id).await;
        Ok(transcription)
    }

    /// Processes one candidate answer.
    ///
    /// A second submission while a turn for the same session is running is
    /// rejected with [`MockviewError::TurnInProgress`].
    pub async fn process_turn(
        &self,
        session_id: &str,
        input: TurnInput,
    ) -> Result<TurnOutcome, MockviewError> {
        let started = Instant::now();
        let mut session = self.lock_for_turn(session_id)?;
        let input_type = input.input_type();
        let total = self.questions.len();

        let Some(main_question) = self.current(&session).cloned() else {
            // Nothing left to ask; no upstream calls.
            session.completed = true;
            session.touch();
            let user_input = match input.content {
                TurnContent::Text(text) => text,
                TurnContent::Audio { .. } => String::new(),
            };
            return Ok(self.closing_outcome(&session, input_type, user_input, started));
        };

        let (answer, transcription) = match input.content {
            TurnContent::Text(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    return Err(MockviewError::InvalidInput("answer text is empty".into()));
                }
                (text, None)
            }
            TurnContent::Audio { bytes, format } => {
                let transcription = self.recognizer.transcribe(bytes, format).await?;
                if transcription.text.is_empty() {
                    return Err(MockviewError::InvalidAudio {
                        reason: "no speech detected".into(),
                    });
                }
                (transcription.text.clone(), Some(transcription))
            }
        };

        let asked = pending_follow_up(&session)
            .unwrap_or(&main_question.text)
            .to_string();
        let context = input
            .context
            .unwrap_or_else(|| session.recent_context(CONTEXT_TURNS));

        let assessment = self
            .planner
            .assess(session_id, &asked, &answer, &context)
            .await;

        let (ai_response, action, strategy, confidence, follow_up) =
            if session.follow_up_available() && assessment.needs_follow_up {
                let follow_up = self
                    .chatbot
                    .generate(
                        session_id,
                        &FollowUpPrompt {
                            question: &asked,
                            answer: &answer,
                            context: &context,
                            style: session.style,
                            assessment: &assessment,
                        },
                    )
                    .await;
                session.follow_up_count = 1;
                session.follow_up_questions.push(follow_up.question.clone());
                (
                    follow_up.question.clone(),
                    TurnAction::FollowUp,
                    Some(follow_up.strategy),
                    follow_up.confidence,
                    Some(follow_up.question),
                )
            } else {
                session.advance(total);
                match self.current(&session) {
                    Some(next) => (
                        next.text.clone(),
                        TurnAction::NextQuestion,
                        None,
                        MAIN_QUESTION_CONFIDENCE,
                        None,
                    ),
                    None => (
                        CLOSING_MESSAGE.to_string(),
                        TurnAction::InterviewCompleted,
                        None,
                        MAIN_QUESTION_CONFIDENCE,
                        None,
                    ),
                }
            };

        // Commit. No awaits past this point, so a cancelled turn leaves no trace.
        let latency_ms = started.elapsed().as_millis() as u64;
        let now = Utc::now();
        self.store.memory().append(session_id, &asked, &answer);
        session.responses.push(ResponseEntry {
            question_id: main_question.id.clone(),
            question: asked,
            answer: answer.clone(),
            follow_up,
            input_type,
            timestamp: now,
        });
        session.interactions.push(Interaction {
            timestamp: now,
            input_type,
            user_input: answer.clone(),
            ai_response: ai_response.clone(),
            latency_ms,
            strategy,
            transcription: transcription.clone(),
        });
        session.total_interactions += 1;
        session.touch();

        info!(
            session_id,
            action = ?action,
            question_index = session.question_index,
            latency_ms,
            "turn processed"
        );

        Ok(TurnOutcome {
            session_id: session.id.clone(),
            input_type,
            user_input: answer,
            ai_response,
            action,
            strategy,
            focus_area: Some(assessment.suggested_focus),
            confidence,
            processing_time_ms: latency_ms,
            question_index: session.question_index,
            total_questions: total,
            follow_up_count: session.follow_up_count,
            total_interactions: session.total_interactions,
            completed: session.completed,
            analysis_summary: Some(AnalysisSummary::from(&assessment)),
            transcription,
        })
    }

    /// Analyzes `answer` against the current question and asks its follow-up.
    ///
    /// Fails with [`MockviewError::FollowUpLimitReached`] once the question's
    /// follow-up has been used.
    pub async fn request_follow_up(
        &self,
        session_id: &str,
        answer: &str,
        context: Option<&str>,
    ) -> Result<ManualFollowUp, MockviewError> {
        let started = Instant::now();
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(MockviewError::InvalidInput("answer text is empty".into()));
        }

        let mut session = self.lock_for_turn(session_id)?;
        if session.completed {
            return Err(MockviewError::InvalidInput(
                "interview is already completed".into(),
            ));
        }
        if !session.follow_up_available() {
            return Err(MockviewError::FollowUpLimitReached {
                session_id: session_id.to_string(),
                question_index: session.question_index,
            });
        }
        let Some(question) = self.current(&session).cloned() else {
            return Err(MockviewError::InvalidInput("no current question".into()));
        };

        let context = context
            .map(str::to_string)
            .unwrap_or_else(|| session.recent_context(CONTEXT_TURNS));
        let assessment = self
            .planner
            .assess(session_id, &question.text, answer, &context)
            .await;
        let FollowUp {
            question: follow_up,
            strategy,
            method,
            confidence,
        } = self
            .chatbot
            .generate(
                session_id,
                &FollowUpPrompt {
                    question: &question.text,
                    answer,
                    context: &context,
                    style: session.style,
                    assessment: &assessment,
                },
            )
            .await;

        let now = Utc::now();
        self.store.memory().append(session_id, &question.text, answer);
        session.follow_up_count = 1;
        session.follow_up_questions.push(follow_up.clone());
        session.responses.push(ResponseEntry {
            question_id: question.id,
            question: question.text,
            answer: answer.to_string(),
            follow_up: Some(follow_up.clone()),
            input_type: InputType::Text,
            timestamp: now,
        });
        session.interactions.push(Interaction {
            timestamp: now,
            input_type: InputType::Text,
            user_input: answer.to_string(),
            ai_response: follow_up.clone(),
            latency_ms: started.elapsed().as_millis() as u64,
            strategy: Some(strategy),
            transcription: None,
        });
        session.total_interactions += 1;
        session.touch();
        debug!(session_id, %strategy, %method, "manual follow-up generated");

        Ok(ManualFollowUp {
            session_id: session_id.to_string(),
            question: follow_up,
            strategy,
            method,
            confidence,
            follow_up_count: session.follow_up_count,
            analysis_summary: AnalysisSummary::from(&assessment),
        })
    }

    /// Moves to the next main question without an answer.
    pub async fn advance(&self, session_id: &str) -> Result<AdvanceOutcome, MockviewError> {
        let mut session = self.lock_for_turn(session_id)?;
        if !session.completed {
            session.advance(self.questions.len());
        }
        session.touch();
        info!(
            session_id,
            question_index = session.question_index,
            completed = session.completed,
            "advanced to next question"
        );

        Ok(AdvanceOutcome {
            session_id: session.id.clone(),
            question_index: session.question_index,
            total_questions: self.questions.len(),
            question: self.current(&session).cloned(),
            completed: session.completed,
        })
    }

    /// Marks the interview completed.
    pub async fn complete(&self, session_id: &str) -> Result<InterviewStatus, MockviewError> {
        let mut session = self.lock_for_turn(session_id)?;
        session.completed = true;
        session.touch();
        info!(session_id, "interview marked complete");
        Ok(self.snapshot(&session))
    }

    /// Changes the tone used for subsequent follow-ups.
    pub async fn set_style(&self, session_id: &str, style: InterviewStyle) -> Result<(), MockviewError> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock().await;
        session.style = style;
        session.touch();
        debug!(session_id, %style, "interview style updated");
        Ok(())
    }

    /// Drops the session and its conversation memory.
    ///
    /// Rejected with [`MockviewError::TurnInProgress`] while a turn is running.
    pub fn reset(&self, session_id: &str) -> Result<(), MockviewError> {
        self.store.reset(session_id)
    }

    /// Generates and persists the session's report.
    ///
    /// Fails with [`MockviewError::NoHistory`] when no answer was analyzed.
    /// The file write is bounded by the report timeout.
    pub async fn generate_report(
        &self,
        session_id: &str,
        candidate_name: Option<&str>,
    ) -> Result<SavedReport, MockviewError> {
        let request = {
            let handle = self.handle(session_id)?;
            let session = handle.lock().await;
            ReportRequest {
                session_id: session.id.clone(),
                candidate_name: candidate_name
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(ANONYMOUS)
                    .to_string(),
                duration_minutes: session.duration_minutes(),
                questions_covered: questions_covered(&session),
                follow_up_questions: session.follow_up_questions.len(),
            }
        };

        let report = self.reports.generate(&request).await?;
        tokio::time::timeout(self.report_timeout, self.writer.write(report))
            .await
            .map_err(|_| MockviewError::Timeout {
                duration: self.report_timeout,
            })?
    }

    fn handle(&self, session_id: &str) -> Result<SessionHandle, MockviewError> {
        self.store
            .get(session_id)
            .ok_or_else(|| MockviewError::SessionNotFound(session_id.to_string()))
    }

    fn lock_for_turn(&self, session_id: &str) -> Result<OwnedMutexGuard<Session>, MockviewError> {
        let handle = self.handle(session_id)?;
        let guard = handle
            .clone()
            .try_lock_owned()
            .map_err(|_| MockviewError::TurnInProgress(session_id.to_string()))?;
        // A reset between the lookup and the lock leaves this handle orphaned.
        if !self.store.is_live(session_id, &handle) {
            return Err(MockviewError::SessionNotFound(session_id.to_string()));
        }
        Ok(guard)
    }

    fn current(&self, session: &Session) -> Option<&InterviewQuestion> {
        if session.completed {
            return None;
        }
        self.questions.question(session.question_index)
    }

    fn snapshot(&self, session: &Session) -> InterviewStatus {
        InterviewStatus {
            session_id: session.id.clone(),
            style: session.style,
            phase: session.phase().to_string(),
            question_index: session.question_index,
            total_questions: self.questions.len(),
            follow_up_count: session.follow_up_count,
            total_interactions: session.total_interactions,
            responses: session.responses.len(),
            analyzed_answers: self.store.memory().len(&session.id),
            completed: session.completed,
            created_at: session.created_at,
            last_activity: session.last_activity,
            duration_minutes: session.duration_minutes(),
        }
    }

    fn closing_outcome(
        &self,
        session: &Session,
        input_type: InputType,
        user_input: String,
        started: Instant,
    ) -> TurnOutcome {
        TurnOutcome {
            session_id: session.id.clone(),
            input_type,
            user_input,
            ai_response: CLOSING_MESSAGE.to_string(),
            action: TurnAction::InterviewCompleted,
            strategy: None,
            focus_area: None,
            confidence: MAIN_QUESTION_CONFIDENCE,
            processing_time_ms: started.elapsed().as_millis() as u64,
            question_index: session.question_index,
            total_questions: self.questions.len(),
            follow_up_count: session.follow_up_count,
            total_interactions: session.total_interactions,
            completed: true,
            analysis_summary: None,
            transcription: None,
        }
    }
}

/// Number of distinct main questions with at least one recorded answer.
fn questions_covered(session: &Session) -> usize {
    let mut ids: Vec<&str> = session
        .responses
        .iter()
        .map(|entry| entry.question_id.as_str())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

/// The follow-up awaiting an answer, if the current question has one.
fn pending_follow_up(session: &Session) -> Option<&str> {
    if session.follow_up_count == 0 || session.completed {
        return None;
    }
    session
        .responses
        .last()
        .and_then(|entry| entry.follow_up.as_deref())
}
