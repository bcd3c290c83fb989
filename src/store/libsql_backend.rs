//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. The ownership-sensitive
//! writes (session claim, verification consumption) are single conditional
//! updates so there is no check-then-set window at this layer.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::cases::model::{Case, CaseStatus, ClaimType};
use crate::error::DatabaseError;
use crate::evidence::model::EvidenceRecord;
use crate::router::model::{
    Classification, EligibilityAssessment, RouterSession, SessionStatus,
};
use crate::store::migrations;
use crate::store::traits::{
    AnalyticsEvent, ClaimOutcome, Database, EmailVerification, User,
};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_optional_uuid(s: &Option<String>) -> Option<Uuid> {
    s.as_ref().map(|s| parse_uuid(s))
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

const SESSION_COLUMNS: &str = "id, session_token, status, dispute_narrative, classification_result, eligibility_assessment, converted_to_user_id, converted_to_case_id, converted_at, created_at, updated_at";

const CASE_COLUMNS: &str = "id, user_id, case_status, claim_type, dispute_narrative, created_at";

/// Map a libsql Row to a RouterSession. Column order matches SESSION_COLUMNS.
fn row_to_session(row: &libsql::Row) -> Result<RouterSession, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("session row id: {e}")))?;
    let token: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("session row token: {e}")))?;
    let status_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("session row status: {e}")))?;
    let narrative: Option<String> = row.get(3).ok();
    let classification_str: Option<String> = row.get(4).ok();
    let assessment_str: Option<String> = row.get(5).ok();
    let user_id_str: Option<String> = row.get(6).ok();
    let case_id_str: Option<String> = row.get(7).ok();
    let converted_at_str: Option<String> = row.get(8).ok();
    let created_str: String = row
        .get(9)
        .map_err(|e| DatabaseError::Query(format!("session row created_at: {e}")))?;
    let updated_str: String = row
        .get(10)
        .map_err(|e| DatabaseError::Query(format!("session row updated_at: {e}")))?;

    let classification_result: Option<Classification> = classification_str
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok());
    let eligibility_assessment: Option<EligibilityAssessment> = assessment_str
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok());

    Ok(RouterSession {
        id: parse_uuid(&id_str),
        session_token: token,
        status: SessionStatus::parse(&status_str),
        dispute_narrative: narrative,
        classification_result,
        eligibility_assessment,
        converted_to_user_id: parse_optional_uuid(&user_id_str),
        converted_to_case_id: parse_optional_uuid(&case_id_str),
        converted_at: parse_optional_datetime(&converted_at_str),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

/// Map a libsql Row to a Case. Column order matches CASE_COLUMNS.
fn row_to_case(row: &libsql::Row) -> Result<Case, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("case row id: {e}")))?;
    let user_id_str: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("case row user_id: {e}")))?;
    let _status_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("case row status: {e}")))?;
    let claim_type_str: String = row
        .get(3)
        .map_err(|e| DatabaseError::Query(format!("case row claim_type: {e}")))?;
    let narrative: Option<String> = row.get(4).ok();
    let created_str: String = row
        .get(5)
        .map_err(|e| DatabaseError::Query(format!("case row created_at: {e}")))?;

    Ok(Case {
        id: parse_uuid(&id_str),
        user_id: parse_uuid(&user_id_str),
        case_status: CaseStatus::Draft,
        claim_type: ClaimType::parse(&claim_type_str),
        dispute_narrative: narrative,
        created_at: parse_datetime(&created_str),
    })
}

fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("user row id: {e}")))?;
    let email: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("user row email: {e}")))?;
    let created_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("user row created_at: {e}")))?;

    Ok(User {
        id: parse_uuid(&id_str),
        email,
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn get_session_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RouterSession>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM router_sessions WHERE session_token = ?1"),
                params![token],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_session_by_token: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_session(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_session_by_token: {e}"))),
        }
    }

    async fn record_classification(
        &self,
        token: &str,
        narrative: &str,
        classification: &Classification,
    ) -> Result<(), DatabaseError> {
        let classification_json = serde_json::to_string(classification)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        // Upsert keyed on the token. The DO UPDATE guard makes converted
        // sessions immutable: the write silently becomes a no-op.
        self.conn()
            .execute(
                "INSERT INTO router_sessions (id, session_token, status, dispute_narrative, classification_result, created_at, updated_at)
                 VALUES (?1, ?2, 'CLASSIFIED', ?3, ?4, ?5, ?5)
                 ON CONFLICT(session_token) DO UPDATE SET
                     dispute_narrative = excluded.dispute_narrative,
                     classification_result = excluded.classification_result,
                     status = 'CLASSIFIED',
                     updated_at = excluded.updated_at
                 WHERE router_sessions.converted_to_user_id IS NULL",
                params![
                    Uuid::new_v4().to_string(),
                    token,
                    narrative,
                    classification_json,
                    now
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("record_classification: {e}")))?;

        debug!(session = %token, "Classification recorded");
        Ok(())
    }

    async fn record_assessment(
        &self,
        token: &str,
        assessment: &EligibilityAssessment,
    ) -> Result<(), DatabaseError> {
        let assessment_json = serde_json::to_string(assessment)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        self.conn()
            .execute(
                "INSERT INTO router_sessions (id, session_token, status, eligibility_assessment, created_at, updated_at)
                 VALUES (?1, ?2, 'ASSESSED', ?3, ?4, ?4)
                 ON CONFLICT(session_token) DO UPDATE SET
                     eligibility_assessment = excluded.eligibility_assessment,
                     status = 'ASSESSED',
                     updated_at = excluded.updated_at
                 WHERE router_sessions.converted_to_user_id IS NULL",
                params![Uuid::new_v4().to_string(), token, assessment_json, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("record_assessment: {e}")))?;

        debug!(session = %token, "Assessment recorded");
        Ok(())
    }

    async fn claim_session(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<ClaimOutcome, DatabaseError> {
        let now = Utc::now().to_rfc3339();

        // Atomic compare-and-swap on the ownership column.
        let claimed = self
            .conn()
            .execute(
                "UPDATE router_sessions
                 SET converted_to_user_id = ?1, status = 'CONVERTED', converted_at = ?2, updated_at = ?2
                 WHERE session_token = ?3 AND converted_to_user_id IS NULL",
                params![user_id.to_string(), now, token],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("claim_session: {e}")))?;

        if claimed == 1 {
            debug!(session = %token, user = %user_id, "Session claimed");
            return Ok(ClaimOutcome::Claimed);
        }

        // The update matched nothing: either the session doesn't exist or
        // it already has an owner.
        let mut rows = self
            .conn()
            .query(
                "SELECT converted_to_user_id FROM router_sessions WHERE session_token = ?1",
                params![token],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("claim_session owner check: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let owner: Option<String> = row.get(0).ok();
                match parse_optional_uuid(&owner) {
                    Some(owner) if owner == user_id => Ok(ClaimOutcome::AlreadyOwned),
                    _ => Ok(ClaimOutcome::OwnedByOther),
                }
            }
            Ok(None) => Ok(ClaimOutcome::NotFound),
            Err(e) => Err(DatabaseError::Query(format!("claim_session owner check: {e}"))),
        }
    }

    async fn mark_session_imported(
        &self,
        session_id: Uuid,
        case_id: Uuid,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "UPDATE router_sessions
                 SET status = 'IMPORTED', converted_to_case_id = ?1, updated_at = ?2
                 WHERE id = ?3",
                params![case_id.to_string(), now, session_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("mark_session_imported: {e}")))?;
        Ok(())
    }

    // ── Cases ───────────────────────────────────────────────────────

    async fn insert_case(&self, case: &Case) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO cases (id, user_id, case_status, claim_type, dispute_narrative, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    case.id.to_string(),
                    case.user_id.to_string(),
                    case.case_status.as_str(),
                    case.claim_type.as_str(),
                    opt_text(case.dispute_narrative.as_deref()),
                    case.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_case: {e}")))?;

        debug!(case_id = %case.id, claim_type = case.claim_type.as_str(), "Case inserted");
        Ok(())
    }

    async fn get_case_for_user(
        &self,
        case_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Case>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1 AND user_id = ?2"),
                params![case_id.to_string(), user_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_case_for_user: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_case(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_case_for_user: {e}"))),
        }
    }

    // ── Evidence ────────────────────────────────────────────────────

    async fn insert_evidence(&self, record: &EvidenceRecord) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO evidence (id, case_id, user_id, filename, file_path, file_type, file_size, description, category, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id.to_string(),
                    record.case_id.to_string(),
                    record.user_id.to_string(),
                    record.filename.as_str(),
                    record.file_path.as_str(),
                    record.file_type.as_str(),
                    record.file_size as i64,
                    record.description.as_str(),
                    record.category.as_str(),
                    record.uploaded_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_evidence: {e}")))?;
        Ok(())
    }

    // ── Best-effort side tables ─────────────────────────────────────

    async fn insert_training_record(
        &self,
        narrative: &str,
        category: &str,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO anonymized_training_data (id, anonymized_narrative, dispute_category, anonymization_method, created_at)
                 VALUES (?1, ?2, ?3, 'regex_v2', ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    narrative,
                    category,
                    Utc::now().to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_training_record: {e}")))?;
        Ok(())
    }

    async fn insert_analytics_event(&self, event: &AnalyticsEvent) -> Result<(), DatabaseError> {
        let data = serde_json::to_string(&event.event_data)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.conn()
            .execute(
                "INSERT INTO analytics_events (id, event_name, user_id, session_id, event_data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    event.event_name.as_str(),
                    opt_text(event.user_id.map(|u| u.to_string()).as_deref()),
                    opt_text(event.session_id.as_deref()),
                    data,
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_analytics_event: {e}")))?;
        Ok(())
    }

    // ── Auth ────────────────────────────────────────────────────────

    async fn upsert_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO users (id, email, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(email) DO NOTHING",
                params![Uuid::new_v4().to_string(), email, Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_user_by_email: {e}")))?;

        let mut rows = self
            .conn()
            .query(
                "SELECT id, email, created_at FROM users WHERE email = ?1",
                params![email],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_user_by_email select: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_user(&row),
            Ok(None) => Err(DatabaseError::NotFound {
                entity: "user".into(),
                id: email.into(),
            }),
            Err(e) => Err(DatabaseError::Query(format!("upsert_user_by_email select: {e}"))),
        }
    }

    async fn insert_email_verification(
        &self,
        code: &str,
        email: &str,
        next_path: Option<&str>,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO email_verifications (code, email, next_path, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![code, email, opt_text(next_path), Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_email_verification: {e}")))?;
        Ok(())
    }

    async fn take_email_verification(
        &self,
        code: &str,
    ) -> Result<Option<EmailVerification>, DatabaseError> {
        // Conditional update first so a code can be consumed at most once.
        let consumed = self
            .conn()
            .execute(
                "UPDATE email_verifications SET consumed_at = ?1
                 WHERE code = ?2 AND consumed_at IS NULL",
                params![Utc::now().to_rfc3339(), code],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("take_email_verification: {e}")))?;

        if consumed != 1 {
            return Ok(None);
        }

        let mut rows = self
            .conn()
            .query(
                "SELECT code, email, next_path FROM email_verifications WHERE code = ?1",
                params![code],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("take_email_verification select: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let code: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("verification row code: {e}")))?;
                let email: String = row
                    .get(1)
                    .map_err(|e| DatabaseError::Query(format!("verification row email: {e}")))?;
                let next_path: Option<String> = row.get(2).ok();
                Ok(Some(EmailVerification {
                    code,
                    email,
                    next_path,
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("take_email_verification select: {e}"))),
        }
    }

    async fn insert_auth_token(&self, token: &str, user_id: Uuid) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token, user_id.to_string(), Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_auth_token: {e}")))?;
        Ok(())
    }

    async fn get_user_by_auth_token(&self, token: &str) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT u.id, u.email, u.created_at FROM users u
                 JOIN auth_tokens t ON t.user_id = u.id
                 WHERE t.token = ?1",
                params![token],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user_by_auth_token: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_user(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_user_by_auth_token: {e}"))),
        }
    }
}
