//! Case creation from a converted router session.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{ApiError, AppState, authenticate};
use crate::cases::model::{Case, derive_claim_type};
use crate::store::ClaimOutcome;

pub fn case_routes() -> axum::Router<AppState> {
    axum::Router::new().route("/api/cases/create-from-session", post(create_from_session))
}

#[derive(Debug, Deserialize)]
struct CreateFromSessionRequest {
    #[serde(default)]
    token: String,
}

/// POST /api/cases/create-from-session
///
/// Materializes a draft case from the caller's router session. Safe to call
/// twice: a session that already imported a case returns the existing id.
async fn create_from_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateFromSessionRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers).await?;

    if body.token.is_empty() {
        return Err(ApiError::invalid("token", "Session token is required"));
    }

    // Reconcile ownership before reading the session: covers callers whose
    // auth callback never ran the claim (e.g. signed in on another device).
    match state.db.claim_session(&body.token, user.id).await? {
        ClaimOutcome::Claimed | ClaimOutcome::AlreadyOwned => {}
        ClaimOutcome::OwnedByOther => {
            return Err(ApiError::Forbidden(
                "Session belongs to another user".to_string(),
            ));
        }
        ClaimOutcome::NotFound => {
            return Err(ApiError::NotFound(
                "No convertible session found".to_string(),
            ));
        }
    }

    let session = state
        .db
        .get_session_by_token(&body.token)
        .await?
        .ok_or_else(|| ApiError::NotFound("No convertible session found".to_string()))?;

    // Idempotency: a second call for an already-imported session returns the
    // linked case instead of inserting a duplicate.
    if let Some(case_id) = session.converted_to_case_id {
        info!(session_id = %session.id, case_id = %case_id, "Session already imported");
        return Ok(Json(serde_json::json!({
            "success": true,
            "caseId": case_id,
            "message": "Case already created from session",
        })));
    }

    let claim_type = derive_claim_type(
        session
            .classification_result
            .as_ref()
            .map(|c| c.claim_type.as_str())
            .unwrap_or_default(),
    );

    let case = Case::draft(user.id, claim_type, session.dispute_narrative.clone());
    state.db.insert_case(&case).await?;

    // Linking the session back is best-effort; the case already exists.
    if let Err(e) = state.db.mark_session_imported(session.id, case.id).await {
        warn!(session_id = %session.id, error = %e, "Failed to mark session as imported");
    }

    state.analytics.track(
        "router_conversion_imported",
        Some(user.id),
        Some(session.session_token.clone()),
        serde_json::json!({
            "case_id": case.id,
            "recommended_path": session
                .eligibility_assessment
                .as_ref()
                .map(|a| a.recommended_path),
        }),
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "caseId": case.id,
        "message": "Case created from session",
    })))
}
