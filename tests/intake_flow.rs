//! Integration tests for the intake API.
//!
//! Each test builds the full Axum router over an in-memory database and a
//! scripted LLM provider, then drives it with `tower::ServiceExt::oneshot` —
//! no network, no real Gemini calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use guidebuoy_intake::analytics::Analytics;
use guidebuoy_intake::api::{AppState, api_routes};
use guidebuoy_intake::auth::Mailer;
use guidebuoy_intake::config::{AppConfig, LlmSettings, RateLimitSettings, RouteLimit};
use guidebuoy_intake::error::{LlmError, MailError};
use guidebuoy_intake::evidence::EvidenceStorage;
use guidebuoy_intake::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use guidebuoy_intake::ratelimit::RateLimiter;
use guidebuoy_intake::store::{Database, LibSqlBackend};

/// LLM provider that replays a scripted list of outcomes.
struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
}

impl ScriptedLlm {
    fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
            }),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::RequestFailed {
                provider: "scripted".to_string(),
                reason: "script exhausted".to_string(),
            }),
        }
    }
}

fn upstream_error() -> LlmError {
    LlmError::RequestFailed {
        provider: "scripted".to_string(),
        reason: "connection refused".to_string(),
    }
}

/// Mailer that records links instead of sending them.
#[derive(Default)]
struct RecordingMailer {
    links: Mutex<Vec<String>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification(&self, _to: &str, link: &str) -> Result<(), MailError> {
        self.links.lock().unwrap().push(link.to_string());
        Ok(())
    }
}

struct TestHarness {
    app: Router,
    db: Arc<LibSqlBackend>,
    mailer: Arc<RecordingMailer>,
    // Kept alive so evidence writes have a place to land.
    _storage_dir: tempfile::TempDir,
}

fn test_config(router_limit: u32, storage_root: &std::path::Path) -> AppConfig {
    AppConfig {
        llm: LlmSettings {
            api_key: secrecy::SecretString::from("test-key"),
            model: "models/gemini-2.5-flash".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
        },
        port: 0,
        db_path: "unused".into(),
        storage_root: storage_root.to_path_buf(),
        public_base: "https://guidebuoyai.sg".to_string(),
        smtp: None,
        rate_limits: RateLimitSettings {
            router: RouteLimit {
                limit: router_limit,
                window: Duration::from_secs(60),
            },
            pre_verify: RouteLimit {
                limit: 50,
                window: Duration::from_secs(300),
            },
        },
        disable_email_rate_limit: false,
    }
}

async fn harness_with_limit(
    responses: Vec<Result<String, LlmError>>,
    router_limit: u32,
) -> TestHarness {
    let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let db: Arc<dyn Database> = backend.clone();
    let mailer = Arc::new(RecordingMailer::default());
    let storage_dir = tempfile::tempdir().unwrap();

    let state = AppState {
        analytics: Analytics::new(db.clone()),
        storage: EvidenceStorage::new(storage_dir.path()),
        limiter: Arc::new(RateLimiter::new()),
        llm: ScriptedLlm::new(responses),
        mailer: mailer.clone(),
        config: Arc::new(test_config(router_limit, storage_dir.path())),
        db,
    };

    TestHarness {
        app: api_routes(state),
        db: backend,
        mailer,
        _storage_dir: storage_dir,
    }
}

async fn harness(responses: Vec<Result<String, LlmError>>) -> TestHarness {
    harness_with_limit(responses, 20).await
}

async fn post_json(
    app: &Router,
    uri: &str,
    auth: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = auth {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Insert a user and mint a bearer token directly through the store.
async fn signed_up_user(db: &LibSqlBackend, email: &str) -> (Uuid, String) {
    let user = db.upsert_user_by_email(email).await.unwrap();
    let token = Uuid::new_v4().simple().to_string();
    db.insert_auth_token(&token, user.id).await.unwrap();
    (user.id, token)
}

fn scam_classification() -> String {
    json!({
        "claim_type": "Scam",
        "summary": "Victim paid for goods that were never delivered.",
        "key_entities": ["Carousell"]
    })
    .to_string()
}

fn self_service_assessment() -> String {
    json!({
        "is_fidrec_eligible": false,
        "eligibility_score": 55,
        "recommended_path": "self_service",
        "reasoning": ["Small claim, clear evidence"],
        "missing_info": [],
        "next_steps": ["Contact the platform"],
        "estimated_timeline": "2-4 weeks",
        "success_probability": "medium"
    })
    .to_string()
}

// ── Classify ────────────────────────────────────────────────────────

#[tokio::test]
async fn classify_returns_parsed_result_and_next_steps() {
    let h = harness(vec![Ok(scam_classification())]).await;

    let (status, body) = post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "I paid a seller and got nothing." }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claimType"], "Scam");
    assert_eq!(body["keyEntities"][0], "Carousell");
    assert_eq!(body["nextSteps"].as_array().unwrap().len(), 4);

    let session = h.db.get_session_by_token("tok-1").await.unwrap().unwrap();
    assert_eq!(
        session.classification_result.unwrap().claim_type,
        "Scam"
    );
}

#[tokio::test]
async fn classify_falls_back_on_upstream_failure() {
    let h = harness(vec![Err(upstream_error())]).await;

    let (status, body) = post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "Some dispute." }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claimType"], "Scam");
    assert!(!body["summary"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn classify_falls_back_on_garbage_output() {
    let h = harness(vec![Ok("I cannot answer that.".to_string())]).await;

    let (status, body) = post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "Some dispute." }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claimType"], "Scam");
    assert!(!body["summary"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn classify_rejects_missing_fields() {
    let h = harness(vec![]).await;

    let (status, body) = post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"]["narrative"].is_string());

    let (status, _) = post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "narrative": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn classify_rejects_over_length_narrative() {
    let h = harness(vec![]).await;

    let (status, body) = post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "x".repeat(20_001) }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(body["details"]["narrative"], "narrative is too long");
}

#[tokio::test]
async fn classify_stores_redacted_narrative() {
    let h = harness(vec![Ok(scam_classification())]).await;

    post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({
            "session_token": "tok-1",
            "narrative": "Contact me at jo.tan@example.com or 9123 4567."
        }),
    )
    .await;

    let session = h.db.get_session_by_token("tok-1").await.unwrap().unwrap();
    let stored = session.dispute_narrative.unwrap();
    assert!(stored.contains("[REDACTED_EMAIL]"));
    assert!(stored.contains("[REDACTED_PHONE]"));
    assert!(!stored.contains("jo.tan@example.com"));
}

// ── Questions / assess ──────────────────────────────────────────────

#[tokio::test]
async fn questions_returns_502_on_unparsable_output() {
    let h = harness(vec![Ok("not json".to_string())]).await;

    let (status, body) = post_json(
        &h.app,
        "/api/router/questions",
        None,
        json!({ "session_token": "tok-1", "classification": { "claim_type": "Scam" } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("questions"));
}

#[tokio::test]
async fn questions_returns_typed_question_set() {
    let questions = json!({
        "questions": [
            { "key": "institution", "question": "Who did you deal with?", "type": "text", "required": true },
            { "key": "amount", "question": "How much did you lose?", "type": "number", "required": false }
        ]
    });
    let h = harness(vec![Ok(questions.to_string())]).await;

    let (status, body) = post_json(
        &h.app,
        "/api/router/questions",
        None,
        json!({ "session_token": "tok-1", "classification": { "claim_type": "Scam" } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questions"].as_array().unwrap().len(), 2);
    assert_eq!(body["questions"][0]["type"], "text");
}

#[tokio::test]
async fn assess_persists_assessment_on_session() {
    let h = harness(vec![Ok(self_service_assessment())]).await;

    let (status, body) = post_json(
        &h.app,
        "/api/router/assess",
        None,
        json!({
            "session_token": "tok-1",
            "classification": { "claim_type": "Scam" },
            "responses": { "amount": "500" }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommended_path"], "self_service");

    let session = h.db.get_session_by_token("tok-1").await.unwrap().unwrap();
    let assessment = session.eligibility_assessment.unwrap();
    assert_eq!(assessment.eligibility_score, 55.0);
}

#[tokio::test]
async fn assess_returns_502_when_path_is_missing() {
    let h = harness(vec![Ok(json!({ "eligibility_score": 10 }).to_string())]).await;

    let (status, _) = post_json(
        &h.app,
        "/api/router/assess",
        None,
        json!({
            "session_token": "tok-1",
            "classification": {},
            "responses": {}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

// ── Rate limiting ───────────────────────────────────────────────────

#[tokio::test]
async fn router_requests_over_ceiling_get_429() {
    let h = harness_with_limit(
        vec![Ok(scam_classification()), Ok(scam_classification())],
        2,
    )
    .await;
    let body = json!({ "session_token": "tok-1", "narrative": "Dispute." });

    for _ in 0..2 {
        let (status, _) = post_json(&h.app, "/api/router/classify", None, body.clone()).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, response) = post_json(&h.app, "/api/router/classify", None, body).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response["error"], "Rate limit exceeded");
}

// ── Case creation ───────────────────────────────────────────────────

#[tokio::test]
async fn create_from_session_requires_auth() {
    let h = harness(vec![]).await;
    let (status, _) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        None,
        json!({ "token": "tok-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_from_session_unknown_token_is_404() {
    let h = harness(vec![]).await;
    let (_, token) = signed_up_user(&h.db, "a@example.com").await;

    let (status, _) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(&token),
        json!({ "token": "no-such-session" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_from_session_is_idempotent() {
    let h = harness(vec![Ok(scam_classification())]).await;
    post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "Marketplace scam." }),
    )
    .await;

    let (_, token) = signed_up_user(&h.db, "a@example.com").await;
    let body = json!({ "token": "tok-1" });

    let (status, first) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(&token),
        body.clone(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);

    let (status, second) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(&token),
        body,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["caseId"], first["caseId"]);
}

#[tokio::test]
async fn create_from_session_by_other_user_is_403() {
    let h = harness(vec![Ok(scam_classification())]).await;
    post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "Scam." }),
    )
    .await;

    let (owner_id, owner_token) = signed_up_user(&h.db, "owner@example.com").await;
    let (_, other_token) = signed_up_user(&h.db, "other@example.com").await;

    let (status, _) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(&owner_token),
        json!({ "token": "tok-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(&other_token),
        json!({ "token": "tok-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner is unchanged.
    let session = h.db.get_session_by_token("tok-1").await.unwrap().unwrap();
    assert_eq!(session.converted_to_user_id, Some(owner_id));
}

// ── Evidence upload ─────────────────────────────────────────────────

fn multipart_body(boundary: &str, case_id: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"receipt.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             fake-png-bytes\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"caseId\"\r\n\r\n\
             {case_id}\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"category\"\r\n\r\n\
             screenshots\r\n\
             --{boundary}--\r\n"
        )
        .as_bytes(),
    );
    body
}

async fn upload_evidence(
    app: &Router,
    auth: Option<&str>,
    case_id: &str,
) -> (StatusCode, Value) {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/evidence/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
    if let Some(token) = auth {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(multipart_body(boundary, case_id))).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn evidence_upload_stores_file_and_metadata() {
    let h = harness(vec![Ok(scam_classification())]).await;
    post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "Scam." }),
    )
    .await;
    let (_, token) = signed_up_user(&h.db, "a@example.com").await;
    let (_, created) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(&token),
        json!({ "token": "tok-1" }),
    )
    .await;
    let case_id = created["caseId"].as_str().unwrap().to_string();

    let (status, body) = upload_evidence(&h.app, Some(&token), &case_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evidence"]["filename"], "receipt.png");
    assert_eq!(body["evidence"]["category"], "screenshots");
    assert_eq!(body["evidence"]["file_type"], "image/png");
    let path = body["evidence"]["file_path"].as_str().unwrap();
    assert!(path.starts_with(&format!("{case_id}/screenshots/")));
}

#[tokio::test]
async fn evidence_upload_scopes_case_to_owner() {
    let h = harness(vec![Ok(scam_classification())]).await;
    post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "Scam." }),
    )
    .await;
    let (_, owner_token) = signed_up_user(&h.db, "owner@example.com").await;
    let (_, other_token) = signed_up_user(&h.db, "other@example.com").await;
    let (_, created) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(&owner_token),
        json!({ "token": "tok-1" }),
    )
    .await;
    let case_id = created["caseId"].as_str().unwrap().to_string();

    let (status, _) = upload_evidence(&h.app, None, &case_id).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = upload_evidence(&h.app, Some(&other_token), &case_id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Auth flow ───────────────────────────────────────────────────────

#[tokio::test]
async fn pre_verify_rejects_bad_email() {
    let h = harness(vec![]).await;
    let (status, _) = post_json(
        &h.app,
        "/api/auth/pre-verify-email",
        None,
        json!({ "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.mailer.links.lock().unwrap().is_empty());
}

#[tokio::test]
async fn signup_callback_claims_session_and_sets_cookie() {
    let h = harness(vec![Ok(scam_classification())]).await;
    post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "Scam." }),
    )
    .await;

    let (status, body) = post_json(
        &h.app,
        "/api/auth/pre-verify-email",
        None,
        json!({ "email": "New.User@Example.com", "source": "router" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let link = h.mailer.links.lock().unwrap()[0].clone();
    assert!(link.starts_with("https://guidebuoyai.sg/api/auth/callback?code="));
    let code = link
        .split("code=")
        .nth(1)
        .unwrap()
        .split('&')
        .next()
        .unwrap()
        .to_string();

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!(
                    "/api/auth/callback?code={code}&next=%2Fapp&session_token=tok-1"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://guidebuoyai.sg/app"
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("gb_session="));

    // Email was normalized and the session claimed.
    let user = h
        .db
        .upsert_user_by_email("new.user@example.com")
        .await
        .unwrap();
    let session = h.db.get_session_by_token("tok-1").await.unwrap().unwrap();
    assert_eq!(session.converted_to_user_id, Some(user.id));

    // The cookie authenticates follow-up requests.
    let bearer = cookie
        .split("gb_session=")
        .nth(1)
        .unwrap()
        .split(';')
        .next()
        .unwrap();
    let (status, created) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(bearer),
        json!({ "token": "tok-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], true);
}

#[tokio::test]
async fn callback_with_bad_code_still_redirects() {
    let h = harness(vec![]).await;

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/callback?code=bogus&next=%2Fapp")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn callback_ignores_absolute_next_urls() {
    let h = harness(vec![]).await;

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/callback?next=https%3A%2F%2Fevil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://guidebuoyai.sg/app"
    );
}

// ── Full funnel ─────────────────────────────────────────────────────

#[tokio::test]
async fn full_funnel_classify_assess_convert_import() {
    let h = harness(vec![
        Ok(scam_classification()),
        Ok(self_service_assessment()),
    ])
    .await;

    let (status, classified) = post_json(
        &h.app,
        "/api/router/classify",
        None,
        json!({ "session_token": "tok-1", "narrative": "I was phished by a fake bank SMS." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(classified["claimType"], "Scam");

    let (status, assessed) = post_json(
        &h.app,
        "/api/router/assess",
        None,
        json!({
            "session_token": "tok-1",
            "classification": { "claim_type": "Scam" },
            "responses": {}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        ["fidrec_eligible", "waitlist", "self_service", "not_eligible"]
            .contains(&assessed["recommended_path"].as_str().unwrap())
    );

    let (_, token) = signed_up_user(&h.db, "funnel@example.com").await;
    let (status, created) = post_json(
        &h.app,
        "/api/cases/create-from-session",
        Some(&token),
        json!({ "token": "tok-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let session = h.db.get_session_by_token("tok-1").await.unwrap().unwrap();
    assert_eq!(session.status.as_str(), "IMPORTED");
    assert_eq!(
        session.converted_to_case_id.unwrap().to_string(),
        created["caseId"].as_str().unwrap()
    );
}
