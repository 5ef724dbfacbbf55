// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Answer quality assessments and follow-up strategy selection.
//!
//! [`select_strategy`] is the only place the follow-up decision rule lives.
//! The follow-up generator calls it to pick a prompt template, and turn
//! summaries report it through [`QualityAssessment::recommended_strategy`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Scores below this value on either axis trigger a `deep_dive` follow-up.
pub const DEEP_DIVE_THRESHOLD: u8 = 6;

/// Assessment confidence above which a `reflection` follow-up is chosen.
pub const REFLECTION_CONFIDENCE: f32 = 0.8;

/// Maximum number of key themes or missing elements in an assessment.
pub const MAX_LIST_ITEMS: usize = 3;

/// Confidence assumed when the model does not report one.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Topic the next follow-up should probe.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    SpecificDetails,
    Leadership,
    ProblemSolving,
    Teamwork,
    ResultsImpact,
    Challenges,
    Learning,
    Motivation,
    #[default]
    General,
}

impl FocusArea {
    /// Parses a model-supplied focus tag, mapping anything unknown to `General`.
    pub fn parse_lenient(value: &str) -> Self {
        value
            .trim()
            .replace([' ', '-'], "_")
            .parse()
            .unwrap_or(Self::General)
    }
}

/// Prompt template family used for a follow-up question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FollowUpStrategy {
    DeepDive,
    Behavioral,
    Reflection,
    Situational,
}

/// Structured assessment of a single answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// 1..=10
    pub completeness_score: u8,
    /// 1..=10
    pub specificity_score: u8,
    pub key_themes: Vec<String>,
    pub missing_elements: Vec<String>,
    pub needs_follow_up: bool,
    pub reasoning: String,
    pub suggested_focus: FocusArea,
    pub conversation_context: String,
    /// Model's self-reported confidence in [0, 1].
    pub confidence: f32,
}

impl QualityAssessment {
    /// Neutral assessment used when the model cannot be reached or its output
    /// cannot be repaired. Never recommends a follow-up.
    pub fn fallback() -> Self {
        Self {
            completeness_score: 5,
            specificity_score: 5,
            key_themes: vec!["general".to_string()],
            missing_elements: Vec::new(),
            needs_follow_up: false,
            reasoning: "System error, unable to analyze".to_string(),
            suggested_focus: FocusArea::General,
            conversation_context: "Analysis failed".to_string(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Strategy the follow-up generator would use for this assessment.
    pub fn recommended_strategy(&self) -> FollowUpStrategy {
        select_strategy(self)
    }
}

/// Chooses the follow-up strategy for an assessment.
///
/// Priority: weak scores first, then behavioral focus areas, then high
/// confidence, with `situational` as the default.
pub fn select_strategy(assessment: &QualityAssessment) -> FollowUpStrategy {
    if assessment.completeness_score < DEEP_DIVE_THRESHOLD
        || assessment.specificity_score < DEEP_DIVE_THRESHOLD
    {
        return FollowUpStrategy::DeepDive;
    }

    match assessment.suggested_focus {
        FocusArea::Leadership | FocusArea::Teamwork | FocusArea::ProblemSolving => {
            FollowUpStrategy::Behavioral
        }
        _ if assessment.confidence > REFLECTION_CONFIDENCE => FollowUpStrategy::Reflection,
        _ => FollowUpStrategy::Situational,
    }
}
