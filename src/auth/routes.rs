//! Auth endpoints: pre-verify-email and the callback exchange.

use std::sync::LazyLock;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::{ApiError, AppState, AUTH_COOKIE, check_rate_limit};
use crate::store::ClaimOutcome;

/// One year, in seconds. Tokens are revoked by deleting the row, not by
/// cookie expiry.
const AUTH_COOKIE_MAX_AGE: u64 = 365 * 24 * 60 * 60;

static EMAIL_FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("valid email regex")
});

pub fn auth_routes() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/api/auth/pre-verify-email", post(pre_verify_email))
        .route("/api/auth/callback", get(callback))
}

/// Percent-encode a query-string value.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ── POST /api/auth/pre-verify-email ─────────────────────────────────

#[derive(Debug, Deserialize)]
struct PreVerifyRequest {
    #[serde(default)]
    email: String,
    source: Option<String>,
}

async fn pre_verify_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PreVerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    if state.config.disable_email_rate_limit {
        warn!("Pre-verify rate limit bypassed via configuration");
    } else {
        check_rate_limit(
            &state,
            &headers,
            "/api/auth/pre-verify-email",
            state.config.rate_limits.pre_verify,
        )?;
    }

    let email = body.email.trim().to_lowercase();
    if !EMAIL_FORMAT_RE.is_match(&email) {
        return Err(ApiError::invalid("email", "A valid email is required"));
    }

    let mut next_path = format!("/auth/sign-up?verified=1&email={}", urlencode(&email));
    if let Some(source) = body.source.as_deref().filter(|s| !s.is_empty()) {
        next_path.push_str(&format!("&source={}", urlencode(source)));
    }

    let code = Uuid::new_v4().simple().to_string();
    state
        .db
        .insert_email_verification(&code, &email, Some(&next_path))
        .await?;

    let link = format!(
        "{}/api/auth/callback?code={}&next={}",
        state.config.public_base,
        code,
        urlencode(&next_path)
    );
    info!(base = %state.config.public_base, "Sending verification link");

    if let Err(e) = state.mailer.send_verification(&email, &link).await {
        error!(error = %e, "Failed to send verification link");
        return Err(ApiError::invalid("email", "Unable to send verification link"));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

// ── GET /api/auth/callback ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    next: Option<String>,
    session_token: Option<String>,
}

/// Browser-facing, not a JSON API: the user always ends up redirected to
/// `next`, whether or not the code exchange worked. Failures are logged.
async fn callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    // Relative paths only; anything else is an open-redirect vector.
    let next = query
        .next
        .as_deref()
        .filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or("/app");
    let location = format!("{}{}", state.config.public_base, next);

    let token = match &query.code {
        Some(code) => exchange_code(&state, code, query.session_token.as_deref()).await,
        None => None,
    };

    let mut response = Redirect::to(&location).into_response();
    if let Some(token) = token {
        let cookie = format!(
            "{AUTH_COOKIE}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={AUTH_COOKIE_MAX_AGE}"
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            Err(e) => error!(error = %e, "Failed to build auth cookie"),
        }
    }
    response
}

/// Consume the one-time code, mint a bearer token, and claim the router
/// session when one rode along. Any failure returns None.
async fn exchange_code(state: &AppState, code: &str, session_token: Option<&str>) -> Option<String> {
    let verification = match state.db.take_email_verification(code).await {
        Ok(Some(v)) => v,
        Ok(None) => {
            warn!("Callback received unknown or already-used code");
            return None;
        }
        Err(e) => {
            error!(error = %e, "Failed to look up verification code");
            return None;
        }
    };

    let user = match state.db.upsert_user_by_email(&verification.email).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Failed to upsert user during callback");
            return None;
        }
    };

    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    if let Err(e) = state.db.insert_auth_token(&token, user.id).await {
        error!(error = %e, "Failed to mint auth token");
        return None;
    }

    if let Some(session_token) = session_token.filter(|t| !t.is_empty()) {
        match state.db.claim_session(session_token, user.id).await {
            Ok(ClaimOutcome::Claimed) => {
                info!(user_id = %user.id, "Router session claimed during callback");
            }
            Ok(ClaimOutcome::AlreadyOwned) => {}
            Ok(ClaimOutcome::OwnedByOther) => {
                warn!(user_id = %user.id, "Router session already owned by another user");
            }
            Ok(ClaimOutcome::NotFound) => {
                warn!("Router session token from callback matched no session");
            }
            Err(e) => error!(error = %e, "Failed to claim router session during callback"),
        }
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format_accepts_normal_addresses() {
        assert!(EMAIL_FORMAT_RE.is_match("jo.tan+test@example.com.sg"));
        assert!(!EMAIL_FORMAT_RE.is_match("not-an-email"));
        assert!(!EMAIL_FORMAT_RE.is_match("a@b"));
        assert!(!EMAIL_FORMAT_RE.is_match("spaces in@example.com"));
    }

    #[test]
    fn urlencode_escapes_reserved_characters() {
        assert_eq!(urlencode("abc-123_.~"), "abc-123_.~");
        assert_eq!(urlencode("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(
            urlencode("/auth/sign-up?verified=1"),
            "%2Fauth%2Fsign-up%3Fverified%3D1"
        );
    }
}
