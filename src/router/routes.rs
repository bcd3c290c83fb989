//! Router endpoints: classify, questions, assess.
//!
//! All three share the same pipeline: rate limit, validate, redact, one
//! Gemini call in JSON mode, parse. Only the failure policy differs —
//! classify falls back to a canned result so the funnel never stalls, while
//! questions and assess surface a 502 when the model output cannot be
//! parsed.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiError, AppState, check_rate_limit};
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest};
use crate::router::model::{Classification, EligibilityAssessment, QuestionSet};
use crate::router::prompts;
use crate::rules::immediate_next_steps;
use crate::safety::{redact_json, redact_text};

const MAX_NARRATIVE_CHARS: usize = 20_000;

pub fn router_routes() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/api/router/classify", post(classify))
        .route("/api/router/questions", post(questions))
        .route("/api/router/assess", post(assess))
}

fn require_session_token(token: &str) -> Result<(), ApiError> {
    if token.is_empty() {
        return Err(ApiError::invalid("session_token", "session_token is required"));
    }
    Ok(())
}

/// Upstream transport failures are our fault as far as the caller is
/// concerned; only the provider's own throttle maps through as 429.
fn map_llm_error(e: LlmError) -> ApiError {
    match e {
        LlmError::RateLimited { .. } => ApiError::RateLimited,
        other => {
            warn!(error = %other, "LLM call failed");
            ApiError::Internal
        }
    }
}

// ── POST /api/router/classify ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ClassifyRequest {
    #[serde(default)]
    session_token: String,
    #[serde(default)]
    narrative: String,
}

async fn classify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ClassifyRequest>,
) -> Result<Json<Value>, ApiError> {
    check_rate_limit(&state, &headers, "/api/router/classify", state.config.rate_limits.router)?;
    require_session_token(&body.session_token)?;
    if body.narrative.is_empty() {
        return Err(ApiError::invalid("narrative", "narrative is required"));
    }
    if body.narrative.chars().count() > MAX_NARRATIVE_CHARS {
        return Err(ApiError::invalid("narrative", "narrative is too long"));
    }

    let redacted = redact_text(&body.narrative);

    let request = CompletionRequest::new(vec![
        ChatMessage::system(prompts::build_classify_system_prompt()),
        ChatMessage::user(prompts::build_classify_user_prompt(&redacted)),
    ])
    .with_json_response();

    info!(model = state.llm.model_name(), "Calling Gemini for classification");
    let classification = match state.llm.complete(request).await {
        Ok(response) => parse_classification(&response.content).unwrap_or_else(|e| {
            warn!(
                raw_preview = %response.content.chars().take(400).collect::<String>(),
                error = %e,
                "Classification parse failed, using fallback"
            );
            Classification::fallback()
        }),
        Err(e) => {
            warn!(error = %e, "Classification call failed, using fallback");
            Classification::fallback()
        }
    };

    // Both persistence writes are best-effort: classification must never
    // block the funnel.
    if let Err(e) = state
        .db
        .record_classification(&body.session_token, &redacted, &classification)
        .await
    {
        warn!(error = %e, "Failed to persist classification on session");
    }
    if let Err(e) = state
        .db
        .insert_training_record(&redacted, &classification.claim_type)
        .await
    {
        warn!(error = %e, "Failed to persist anonymized training data");
    }

    let mut reply = serde_json::Map::new();
    reply.insert("claimType".into(), classification.claim_type.into());
    reply.insert("summary".into(), classification.summary.into());
    if let Some(entities) = classification.key_entities {
        reply.insert("keyEntities".into(), entities.into());
    }
    reply.insert("nextSteps".into(), immediate_next_steps().into());
    Ok(Json(Value::Object(reply)))
}

fn parse_classification(raw: &str) -> Result<Classification, String> {
    let json_str = prompts::extract_json_object(raw);
    let classification: Classification =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;
    if classification.claim_type.is_empty() || classification.summary.is_empty() {
        return Err("Parsed JSON is missing required fields".to_string());
    }
    Ok(classification)
}

// ── POST /api/router/questions ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QuestionsRequest {
    #[serde(default)]
    session_token: String,
    classification: Option<Value>,
}

async fn questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<QuestionsRequest>,
) -> Result<Json<QuestionSet>, ApiError> {
    check_rate_limit(&state, &headers, "/api/router/questions", state.config.rate_limits.router)?;
    require_session_token(&body.session_token)?;
    let classification = body
        .classification
        .filter(Value::is_object)
        .ok_or_else(|| ApiError::invalid("classification", "classification object is required"))?;

    let redacted = redact_json(&classification);

    let request = CompletionRequest::new(vec![ChatMessage::user(prompts::build_questions_prompt(
        &redacted,
    ))])
    .with_json_response();

    let response = state.llm.complete(request).await.map_err(map_llm_error)?;

    let json_str = prompts::extract_json_object(&response.content);
    let question_set: QuestionSet = serde_json::from_str(&json_str).map_err(|e| {
        warn!(
            raw_preview = %response.content.chars().take(400).collect::<String>(),
            error = %e,
            "Questions parse failed"
        );
        ApiError::UpstreamParse("Unable to parse generated questions".to_string())
    })?;

    Ok(Json(question_set))
}

// ── POST /api/router/assess ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AssessRequest {
    #[serde(default)]
    session_token: String,
    classification: Option<Value>,
    responses: Option<Value>,
}

async fn assess(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AssessRequest>,
) -> Result<Json<EligibilityAssessment>, ApiError> {
    check_rate_limit(&state, &headers, "/api/router/assess", state.config.rate_limits.router)?;
    require_session_token(&body.session_token)?;
    let classification = body
        .classification
        .filter(Value::is_object)
        .ok_or_else(|| ApiError::invalid("classification", "classification object is required"))?;
    let responses = body
        .responses
        .filter(Value::is_object)
        .ok_or_else(|| ApiError::invalid("responses", "responses object is required"))?;

    let redacted_classification = redact_json(&classification);
    let redacted_responses = redact_json(&responses);

    let request = CompletionRequest::new(vec![ChatMessage::user(prompts::build_assess_prompt(
        &redacted_classification,
        &redacted_responses,
    ))])
    .with_json_response();

    let response = state.llm.complete(request).await.map_err(map_llm_error)?;

    let json_str = prompts::extract_json_object(&response.content);
    let assessment: EligibilityAssessment = serde_json::from_str(&json_str).map_err(|e| {
        warn!(
            raw_preview = %response.content.chars().take(400).collect::<String>(),
            error = %e,
            "Assessment parse failed"
        );
        ApiError::UpstreamParse("Unable to parse assessment result".to_string())
    })?;

    if let Err(e) = state
        .db
        .record_assessment(&body.session_token, &assessment)
        .await
    {
        warn!(error = %e, "Failed to persist assessment on session");
    }

    Ok(Json(assessment))
}
