// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-of-interview reports.
//!
//! [`ReportGenerator`] turns a session's conversation memory into an
//! [`InterviewReport`] with one JSON-mode model call (plus one repair).
//! [`ReportWriter`] persists each report as a JSON record and a Markdown
//! summary under a date-stamped directory.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockview_core::traits::ProviderAdapter;
use mockview_core::MockviewError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::gate::CallGate;
use crate::memory::ConversationMemory;
use crate::prompts::{REPORT_SCHEMA, SamplingProfile, report_messages};
use crate::structured::{bounded_score, complete_structured, parse_model_json};

/// Candidate name used when none is given.
pub const ANONYMOUS: &str = "Anonymous";

const MAX_NAME_LEN: usize = 50;

/// Hiring recommendation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum HiringRecommendation {
    StronglyRecommend,
    Recommend,
    Neutral,
    NotRecommend,
}

/// Score and evidence for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAssessment {
    pub skill_name: String,
    pub score: u8,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
}

/// A complete interview report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewReport {
    pub session_id: String,
    pub candidate_name: String,
    pub interview_date: String,
    pub duration_minutes: f64,
    pub overall_score: u8,
    pub overall_summary: String,
    pub skill_assessments: Vec<SkillAssessment>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub behavioral_insights: Vec<String>,
    pub question_performance: Vec<serde_json::Value>,
    pub hiring_recommendation: HiringRecommendation,
    pub next_steps: Vec<String>,
    pub total_questions: usize,
    pub follow_up_questions: usize,
    pub response_quality_avg: f64,
    pub generated_at: DateTime<Utc>,
}

/// Session facts the report is built around.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub session_id: String,
    pub candidate_name: String,
    pub duration_minutes: f64,
    /// Distinct main questions the candidate answered.
    pub questions_covered: usize,
    pub follow_up_questions: usize,
}

/// Model-authored part of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBody {
    pub overall_score: u8,
    pub overall_summary: String,
    pub skill_assessments: Vec<SkillAssessment>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub behavioral_insights: Vec<String>,
    pub question_performance: Vec<serde_json::Value>,
    pub hiring_recommendation: HiringRecommendation,
    pub next_steps: Vec<String>,
    pub response_quality_avg: f64,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    overall_score: f64,
    overall_summary: String,
    #[serde(default)]
    skill_assessments: Vec<RawSkill>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    areas_for_improvement: Vec<String>,
    #[serde(default)]
    behavioral_insights: Vec<String>,
    #[serde(default)]
    question_performance: Vec<serde_json::Value>,
    hiring_recommendation: String,
    #[serde(default)]
    next_steps: Vec<String>,
    #[serde(default)]
    response_quality_avg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawSkill {
    skill_name: String,
    score: f64,
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    improvement_suggestions: Vec<String>,
}

/// Parses and validates the model-authored report body.
pub fn parse_report_body(raw: &str) -> Result<ReportBody, MockviewError> {
    let parsed: RawReport = parse_model_json(raw)?;

    let overall_score = bounded_score("overall_score", parsed.overall_score)?;
    let skill_assessments = parsed
        .skill_assessments
        .into_iter()
        .map(|skill| -> Result<SkillAssessment, MockviewError> {
            Ok(SkillAssessment {
                score: bounded_score(&format!("score for {}", skill.skill_name), skill.score)?,
                skill_name: skill.skill_name,
                evidence: skill.evidence,
                improvement_suggestions: skill.improvement_suggestions,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let hiring_recommendation = parsed
        .hiring_recommendation
        .trim()
        .replace([' ', '-'], "_")
        .parse::<HiringRecommendation>()
        .map_err(|_| MockviewError::Schema {
            message: format!(
                "unknown hiring_recommendation `{}`",
                parsed.hiring_recommendation
            ),
        })?;

    Ok(ReportBody {
        overall_score,
        overall_summary: parsed.overall_summary,
        skill_assessments,
        strengths: parsed.strengths,
        areas_for_improvement: parsed.areas_for_improvement,
        behavioral_insights: parsed.behavioral_insights,
        question_performance: parsed.question_performance,
        hiring_recommendation,
        next_steps: parsed.next_steps,
        response_quality_avg: parsed
            .response_quality_avg
            .unwrap_or(f64::from(overall_score)),
    })
}

impl InterviewReport {
    /// Assembles a report from session facts and a model-authored body.
    pub fn from_body(request: &ReportRequest, body: ReportBody) -> Self {
        let now = Utc::now();
        Self {
            session_id: request.session_id.clone(),
            candidate_name: request.candidate_name.clone(),
            interview_date: now.format("%Y-%m-%d").to_string(),
            duration_minutes: request.duration_minutes,
            overall_score: body.overall_score,
            overall_summary: body.overall_summary,
            skill_assessments: body.skill_assessments,
            strengths: body.strengths,
            areas_for_improvement: body.areas_for_improvement,
            behavioral_insights: body.behavioral_insights,
            question_performance: body.question_performance,
            hiring_recommendation: body.hiring_recommendation,
            next_steps: body.next_steps,
            total_questions: request.questions_covered,
            follow_up_questions: request.follow_up_questions,
            response_quality_avg: body.response_quality_avg,
            generated_at: now,
        }
    }

    /// Deterministic report used when the model cannot produce one.
    pub fn fallback(request: &ReportRequest) -> Self {
        let body = ReportBody {
            overall_score: 5,
            overall_summary: "Report generation failed. Manual review recommended.".into(),
            skill_assessments: Vec::new(),
            strengths: vec!["Unable to assess due to technical issues".into()],
            areas_for_improvement: vec!["Manual review required".into()],
            behavioral_insights: vec!["Technical issues prevented detailed analysis".into()],
            question_performance: Vec::new(),
            hiring_recommendation: HiringRecommendation::Neutral,
            next_steps: vec![
                "Conduct manual review".into(),
                "Consider re-interview if needed".into(),
            ],
            response_quality_avg: 5.0,
        };
        Self::from_body(request, body)
    }

    /// Human-readable Markdown rendering.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Interview Report: {}\n", self.candidate_name);
        let _ = writeln!(md, "- **Session:** {}", self.session_id);
        let _ = writeln!(md, "- **Date:** {}", self.interview_date);
        let _ = writeln!(md, "- **Duration:** {:.1} minutes", self.duration_minutes);
        let _ = writeln!(md, "- **Overall score:** {}/10", self.overall_score);
        let _ = writeln!(
            md,
            "- **Recommendation:** {}",
            self.hiring_recommendation.to_string().replace('_', " ")
        );
        let _ = writeln!(
            md,
            "- **Questions:** {} ({} follow-ups), average quality {:.1}\n",
            self.total_questions, self.follow_up_questions, self.response_quality_avg
        );

        let _ = writeln!(md, "## Summary\n\n{}\n", self.overall_summary);

        if !self.skill_assessments.is_empty() {
            let _ = writeln!(md, "## Skills\n");
            let _ = writeln!(md, "| Skill | Score | Evidence |");
            let _ = writeln!(md, "|---|---|---|");
            for skill in &self.skill_assessments {
                let _ = writeln!(
                    md,
                    "| {} | {}/10 | {} |",
                    skill.skill_name,
                    skill.score,
                    skill.evidence.join("; ")
                );
            }
            md.push('\n');
        }

        push_list(&mut md, "Strengths", &self.strengths);
        push_list(&mut md, "Areas for Improvement", &self.areas_for_improvement);
        push_list(&mut md, "Behavioral Insights", &self.behavioral_insights);
        push_list(&mut md, "Next Steps", &self.next_steps);
        md
    }
}

fn push_list(md: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(md, "## {title}\n");
    for item in items {
        let _ = writeln!(md, "- {item}");
    }
    md.push('\n');
}

/// Produces reports from conversation memory.
pub struct ReportGenerator {
    provider: Arc<dyn ProviderAdapter>,
    gate: CallGate,
    memory: Arc<ConversationMemory>,
    timeout: Duration,
}

impl ReportGenerator {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        gate: CallGate,
        memory: Arc<ConversationMemory>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            gate,
            memory,
            timeout,
        }
    }

    /// Generates a report for the session in `request`.
    ///
    /// Fails with [`MockviewError::NoHistory`] when no answer was analyzed.
    /// Model failures produce [`InterviewReport::fallback`].
    pub async fn generate(&self, request: &ReportRequest) -> Result<InterviewReport, MockviewError> {
        let rounds = self.memory.len(&request.session_id);
        if rounds == 0 {
            return Err(MockviewError::NoHistory(request.session_id.clone()));
        }

        let transcript = self.memory.render_transcript(&request.session_id);
        let chat = SamplingProfile::REPORT.request(
            report_messages(
                &request.candidate_name,
                request.duration_minutes,
                rounds,
                &transcript,
            ),
            true,
        );

        match complete_structured(
            self.provider.as_ref(),
            &self.gate,
            self.timeout,
            chat,
            REPORT_SCHEMA,
            parse_report_body,
        )
        .await
        {
            Ok(body) => {
                info!(
                    session_id = %request.session_id,
                    overall_score = body.overall_score,
                    recommendation = %body.hiring_recommendation,
                    "interview report generated"
                );
                Ok(InterviewReport::from_body(request, body))
            }
            Err(e) => {
                warn!(session_id = %request.session_id, error = %e, "report generation failed, using fallback report");
                Ok(InterviewReport::fallback(request))
            }
        }
    }
}

/// Paths of a persisted report.
#[derive(Debug, Clone, Serialize)]
pub struct SavedReport {
    pub json_path: PathBuf,
    pub summary_path: PathBuf,
    pub report: InterviewReport,
}

/// Writes reports to `{root}/{YYYY-MM-DD}/`.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    root: PathBuf,
}

impl ReportWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the JSON record and Markdown summary, returning both paths.
    pub async fn write(&self, report: InterviewReport) -> Result<SavedReport, MockviewError> {
        let now = Utc::now();
        let dir = self.root.join(now.format("%Y-%m-%d").to_string());
        tokio::fs::create_dir_all(&dir).await.map_err(storage)?;

        let stem = format!(
            "{}_{}_{}",
            now.format("%Y%m%d_%H%M%S"),
            sanitize_name(&report.candidate_name),
            report.session_id.chars().take(8).collect::<String>()
        );
        let json_path = dir.join(format!("{stem}.json"));
        let summary_path = dir.join(format!("{stem}_summary.md"));

        let json = serde_json::to_vec_pretty(&report).map_err(storage)?;
        tokio::fs::write(&json_path, json).await.map_err(storage)?;
        tokio::fs::write(&summary_path, report.to_markdown())
            .await
            .map_err(storage)?;

        info!(
            session_id = %report.session_id,
            path = %json_path.display(),
            "interview report saved"
        );
        Ok(SavedReport {
            json_path,
            summary_path,
            report,
        })
    }
}

fn storage(e: impl std::error::Error + Send + Sync + 'static) -> MockviewError {
    MockviewError::Storage {
        source: Box::new(e),
    }
}

/// Filesystem-safe form of a candidate name.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        ANONYMOUS.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockview_test_utils::MockChatModel;

    const REPORT_JSON: &str = r#"{
        "overall_score": 7,
        "overall_summary": "Clear communicator with concrete examples.",
        "skill_assessments": [
            {"skill_name": "Communication", "score": 8, "evidence": ["Structured answers"], "improvement_suggestions": []}
        ],
        "strengths": ["Ownership"],
        "areas_for_improvement": ["Quantify impact"],
        "behavioral_insights": ["Calm under pressure"],
        "question_performance": [{"question": "Intro", "note": "solid"}],
        "hiring_recommendation": "recommend",
        "next_steps": ["Technical round"],
        "response_quality_avg": 6.5
    }"#;

    fn request() -> ReportRequest {
        ReportRequest {
            session_id: "0123456789abcdef".into(),
            candidate_name: "Ada Lovelace".into(),
            duration_minutes: 12.0,
            questions_covered: 1,
            follow_up_questions: 1,
        }
    }

    fn generator(model: Arc<MockChatModel>, memory: Arc<ConversationMemory>) -> ReportGenerator {
        ReportGenerator::new(
            model,
            CallGate::new(2, Duration::from_secs(1)),
            memory,
            Duration::from_secs(2),
        )
    }

    #[test]
    fn parses_report_body() {
        let body = parse_report_body(REPORT_JSON).unwrap();
        assert_eq!(body.overall_score, 7);
        assert_eq!(body.hiring_recommendation, HiringRecommendation::Recommend);
        assert_eq!(body.skill_assessments[0].score, 8);
        assert_eq!(body.response_quality_avg, 6.5);
    }

    #[test]
    fn recommendation_accepts_spaced_form() {
        let raw = r#"{"overall_score": 9, "overall_summary": "x", "hiring_recommendation": "Strongly Recommend"}"#;
        let body = parse_report_body(raw).unwrap();
        assert_eq!(body.hiring_recommendation, HiringRecommendation::StronglyRecommend);
        assert_eq!(body.response_quality_avg, 9.0);
    }

    #[test]
    fn rejects_unknown_recommendation_and_bad_scores() {
        let raw = r#"{"overall_score": 5, "overall_summary": "x", "hiring_recommendation": "maybe"}"#;
        assert!(matches!(parse_report_body(raw), Err(MockviewError::Schema { .. })));

        let raw = r#"{"overall_score": 5, "overall_summary": "x", "hiring_recommendation": "neutral",
                      "skill_assessments": [{"skill_name": "Teamwork", "score": 14}]}"#;
        let err = parse_report_body(raw).unwrap_err();
        assert!(err.to_string().contains("Teamwork"));
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_name("Ada Lovelace"), "Ada_Lovelace");
        assert_eq!(sanitize_name("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_name("   "), ANONYMOUS);
        assert_eq!(sanitize_name(&"x".repeat(80)).len(), MAX_NAME_LEN);
    }

    #[test]
    fn markdown_lists_sections() {
        let body = parse_report_body(REPORT_JSON).unwrap();
        let report = InterviewReport::from_body(&request(), body);
        let md = report.to_markdown();
        assert!(md.starts_with("# Interview Report: Ada Lovelace"));
        assert!(md.contains("**Recommendation:** recommend"));
        assert!(md.contains("| Communication | 8/10 | Structured answers |"));
        assert!(md.contains("## Strengths\n\n- Ownership"));
    }

    #[tokio::test]
    async fn empty_memory_is_no_history() {
        let model = Arc::new(MockChatModel::with_responses(vec![REPORT_JSON.into()]));
        let generator = generator(model.clone(), Arc::new(ConversationMemory::new()));
        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, MockviewError::NoHistory(id) if id == "0123456789abcdef"));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn generates_from_model_output() {
        let memory = Arc::new(ConversationMemory::new());
        memory.append("0123456789abcdef", "Intro?", "I build databases.");
        memory.append("0123456789abcdef", "Proud of?", "Cutting latency by 40%.");
        let model = Arc::new(MockChatModel::with_responses(vec![REPORT_JSON.into()]));

        let report = generator(model.clone(), memory).generate(&request()).await.unwrap();
        assert_eq!(report.overall_score, 7);
        // Two answered rounds, one of them a follow-up answer.
        assert_eq!(report.total_questions, 1);
        assert_eq!(report.follow_up_questions, 1);

        let sent = model.requests().pop().unwrap();
        assert!(sent.json_output);
        assert!(sent.messages[1].content.contains("Cutting latency by 40%."));
    }

    #[tokio::test]
    async fn model_failure_yields_fallback_report() {
        let memory = Arc::new(ConversationMemory::new());
        memory.append("0123456789abcdef", "Intro?", "Hi.");
        let report = generator(Arc::new(MockChatModel::failing()), memory)
            .generate(&request())
            .await
            .unwrap();
        assert_eq!(report.hiring_recommendation, HiringRecommendation::Neutral);
        assert!(report.overall_summary.contains("Manual review recommended"));
        assert_eq!(report.total_questions, 1);
    }

    #[tokio::test]
    async fn writer_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let report = InterviewReport::fallback(&request());

        let saved = writer.write(report).await.unwrap();
        assert!(saved.json_path.exists());
        assert!(saved.summary_path.exists());

        let name = saved.json_path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_Ada_Lovelace_01234567.json"));
        let date_dir = saved.json_path.parent().unwrap().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(date_dir.len(), "YYYY-MM-DD".len());

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&saved.json_path).unwrap()).unwrap();
        assert_eq!(json["hiring_recommendation"], "neutral");
        let summary = std::fs::read_to_string(&saved.summary_path).unwrap();
        assert!(summary.contains("Manual review recommended"));
    }
}
