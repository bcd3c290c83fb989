//! Evidence metadata model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Metadata row for one uploaded evidence file.
///
/// Field names match the persisted columns; this struct is returned to the
/// client verbatim under the `evidence` key.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceRecord {
    pub id: Uuid,
    pub case_id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: u64,
    pub description: String,
    pub category: String,
    pub uploaded_at: DateTime<Utc>,
}
