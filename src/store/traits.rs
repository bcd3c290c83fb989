//! Unified `Database` trait — single async interface for all persistence.
//!
//! Session state lives entirely here; handlers hold no in-process session
//! cache, so concurrent requests against the same token are serialized only
//! by the backing store's row-level guarantees.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cases::model::Case;
use crate::error::DatabaseError;
use crate::evidence::model::EvidenceRecord;
use crate::router::model::{Classification, EligibilityAssessment, RouterSession};

/// An authenticated account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A pending one-time email verification.
#[derive(Debug, Clone)]
pub struct EmailVerification {
    pub code: String,
    pub email: String,
    pub next_path: Option<String>,
}

/// Result of a session claim attempt.
///
/// Claiming is a single conditional update on the ownership column — never a
/// read followed by a write — so two concurrent claims cannot both succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The session was unclaimed and is now owned by the caller.
    Claimed,
    /// The session was already owned by the caller.
    AlreadyOwned,
    /// The session is owned by a different user.
    OwnedByOther,
    /// No session matches the token.
    NotFound,
}

/// A recorded analytics event. Emission is always fire-and-forget.
#[derive(Debug, Clone)]
pub struct AnalyticsEvent {
    pub event_name: String,
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub event_data: serde_json::Value,
}

/// Backend-agnostic database trait covering sessions, cases, evidence,
/// auth, and the best-effort side tables.
#[async_trait]
pub trait Database: Send + Sync {
    // ── Router sessions ─────────────────────────────────────────────

    /// Look up a session by its client-generated token.
    async fn get_session_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RouterSession>, DatabaseError>;

    /// Store a redacted narrative and its classification on the session,
    /// creating the session if absent. A converted session is immutable;
    /// the write is silently skipped for it.
    async fn record_classification(
        &self,
        token: &str,
        narrative: &str,
        classification: &Classification,
    ) -> Result<(), DatabaseError>;

    /// Store the eligibility assessment on the session (creating it if
    /// absent) and advance its status to ASSESSED. Converted sessions are
    /// not touched.
    async fn record_assessment(
        &self,
        token: &str,
        assessment: &EligibilityAssessment,
    ) -> Result<(), DatabaseError>;

    /// Atomically claim the session for `user_id` if and only if it is
    /// currently unclaimed. On first claim the status moves to CONVERTED
    /// and the claim timestamp is recorded.
    async fn claim_session(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<ClaimOutcome, DatabaseError>;

    /// Terminal transition: link the created case and mark the session
    /// IMPORTED.
    async fn mark_session_imported(
        &self,
        session_id: Uuid,
        case_id: Uuid,
    ) -> Result<(), DatabaseError>;

    // ── Cases ───────────────────────────────────────────────────────

    /// Insert a new case row.
    async fn insert_case(&self, case: &Case) -> Result<(), DatabaseError>;

    /// Get a case by id, scoped to its owner.
    async fn get_case_for_user(
        &self,
        case_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Case>, DatabaseError>;

    // ── Evidence ────────────────────────────────────────────────────

    /// Insert an evidence metadata row.
    async fn insert_evidence(&self, record: &EvidenceRecord) -> Result<(), DatabaseError>;

    // ── Best-effort side tables ─────────────────────────────────────

    /// Insert a redacted narrative into the anonymized training table.
    async fn insert_training_record(
        &self,
        narrative: &str,
        category: &str,
    ) -> Result<(), DatabaseError>;

    /// Insert an analytics event row.
    async fn insert_analytics_event(&self, event: &AnalyticsEvent) -> Result<(), DatabaseError>;

    // ── Auth ────────────────────────────────────────────────────────

    /// Find or create a user for the given (normalized) email.
    async fn upsert_user_by_email(&self, email: &str) -> Result<User, DatabaseError>;

    /// Store a pending one-time verification code.
    async fn insert_email_verification(
        &self,
        code: &str,
        email: &str,
        next_path: Option<&str>,
    ) -> Result<(), DatabaseError>;

    /// Consume a verification code; a code can be taken at most once.
    async fn take_email_verification(
        &self,
        code: &str,
    ) -> Result<Option<EmailVerification>, DatabaseError>;

    /// Mint a bearer token for the user.
    async fn insert_auth_token(&self, token: &str, user_id: Uuid) -> Result<(), DatabaseError>;

    /// Resolve a bearer token to its user.
    async fn get_user_by_auth_token(&self, token: &str) -> Result<Option<User>, DatabaseError>;
}
