//! Router session model — the anonymous intake funnel state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Funnel position of a router session.
///
/// `NEW → CLASSIFIED → ASSESSED → CONVERTED → IMPORTED`. A session is
/// consumed exactly once: conversion binds it to a user, import materializes
/// the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    New,
    Classified,
    Assessed,
    Converted,
    Imported,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Classified => "CLASSIFIED",
            Self::Assessed => "ASSESSED",
            Self::Converted => "CONVERTED",
            Self::Imported => "IMPORTED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CLASSIFIED" => Self::Classified,
            "ASSESSED" => Self::Assessed,
            "CONVERTED" => Self::Converted,
            "IMPORTED" => Self::Imported,
            _ => Self::New,
        }
    }
}

/// An anonymous, token-identified intake session.
#[derive(Debug, Clone)]
pub struct RouterSession {
    pub id: Uuid,
    pub session_token: String,
    pub status: SessionStatus,
    pub dispute_narrative: Option<String>,
    pub classification_result: Option<Classification>,
    pub eligibility_assessment: Option<EligibilityAssessment>,
    pub converted_to_user_id: Option<Uuid>,
    pub converted_to_case_id: Option<Uuid>,
    pub converted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Structured output of the narrative classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub claim_type: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_entities: Option<Vec<String>>,
}

impl Classification {
    /// Fixed fallback used when the upstream call fails or returns garbage.
    /// Classification must never block the funnel.
    pub fn fallback() -> Self {
        Self {
            claim_type: "Scam".to_string(),
            summary: "Failed to classify precisely. Defaulting to scam handling.".to_string(),
            key_entities: None,
        }
    }
}

/// One clarifying question produced by the question generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub key: String,
    pub question: String,
    /// "radio", "text", "number" or "date".
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
}

/// The question set returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
}

/// Recommended next-step path from the eligibility assessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedPath {
    FidrecEligible,
    Waitlist,
    SelfService,
    NotEligible,
}

/// Structured output of the eligibility assessor.
///
/// `recommended_path` is the only field the funnel itself depends on; the
/// rest is surfaced to the user verbatim, so missing fields get lenient
/// defaults rather than failing the parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityAssessment {
    #[serde(default)]
    pub is_fidrec_eligible: bool,
    #[serde(default)]
    pub eligibility_score: f32,
    pub recommended_path: RecommendedPath,
    #[serde(default)]
    pub reasoning: Vec<String>,
    #[serde(default)]
    pub missing_info: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub estimated_timeline: Option<String>,
    #[serde(default)]
    pub success_probability: Option<String>,
}
