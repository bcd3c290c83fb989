//! Shared HTTP plumbing: error taxonomy, app state, auth and rate-limit
//! helpers, and top-level route assembly.

use std::sync::Arc;

use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::error;

use crate::analytics::Analytics;
use crate::auth::mailer::Mailer;
use crate::config::{AppConfig, RouteLimit};
use crate::error::DatabaseError;
use crate::evidence::EvidenceStorage;
use crate::llm::LlmProvider;
use crate::ratelimit::{RateLimiter, key_from};
use crate::store::{Database, User};

/// Cookie carrying the bearer auth token after the callback exchange.
pub const AUTH_COOKIE: &str = "gb_session";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub llm: Arc<dyn LlmProvider>,
    pub config: Arc<AppConfig>,
    pub limiter: Arc<RateLimiter>,
    pub analytics: Analytics,
    pub mailer: Arc<dyn Mailer>,
    pub storage: EvidenceStorage,
}

/// API error taxonomy, mapped one-to-one onto HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request body")]
    Validation { details: serde_json::Value },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("{0}")]
    UpstreamParse(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: &str) -> Self {
        Self::Validation {
            details: serde_json::json!({ field: message }),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamParse(_) => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation { details } => serde_json::json!({
                "error": self.to_string(),
                "details": details,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Data-store failures surface as a generic 500; the detail is logged
/// server-side only. A store-level NotFound keeps its 404 semantics.
impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} {id} not found"))
            }
            other => {
                error!(error = %other, "Database error");
                ApiError::Internal
            }
        }
    }
}

// ── Caller identity ─────────────────────────────────────────────────

/// Extract the bearer token from the Authorization header or the session
/// cookie set by the auth callback.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION)
        && let Ok(value) = value.to_str()
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    let cookies = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == AUTH_COOKIE).then(|| value.to_string())
    })
}

/// Resolve the calling user, or fail with 401.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    state
        .db
        .get_user_by_auth_token(&token)
        .await?
        .ok_or(ApiError::Unauthorized)
}

/// Identifier used as the rate-limit key: bearer token when present,
/// otherwise the forwarded client address, otherwise a shared bucket.
pub fn caller_id(headers: &HeaderMap) -> String {
    if let Some(token) = bearer_token(headers) {
        return token;
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Apply the per-caller, per-route ceiling. Runs before any external work.
pub fn check_rate_limit(
    state: &AppState,
    headers: &HeaderMap,
    route: &str,
    limit: RouteLimit,
) -> Result<(), ApiError> {
    let key = key_from(&caller_id(headers), route);
    if state.limiter.check(&key, limit.limit, limit.window) {
        Ok(())
    } else {
        Err(ApiError::RateLimited)
    }
}

// ── Route assembly ──────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "guidebuoy-intake"
    }))
}

/// Build the full API router.
pub fn api_routes(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/health", get(health))
        .merge(crate::router::routes::router_routes())
        .merge(crate::cases::routes::case_routes())
        .merge(crate::evidence::routes::evidence_routes())
        .merge(crate::auth::routes::auth_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn bearer_from_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn bearer_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; gb_session=tok-9; other=1".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok-9"));
    }

    #[test]
    fn missing_credentials_yield_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn caller_id_prefers_token_then_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(caller_id(&headers), "203.0.113.9");

        headers.insert(header::AUTHORIZATION, "Bearer tok".parse().unwrap());
        assert_eq!(caller_id(&headers), "tok");

        assert_eq!(caller_id(&HeaderMap::new()), "anonymous");
    }

    #[test]
    fn validation_error_carries_details() {
        let err = ApiError::invalid("narrative", "narrative is required");
        let ApiError::Validation { details } = &err else {
            panic!("expected validation error");
        };
        assert_eq!(details["narrative"], "narrative is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::UpstreamParse("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
