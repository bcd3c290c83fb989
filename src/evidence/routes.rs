//! Evidence upload endpoint.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::routing::post;
use chrono::Utc;
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

use crate::api::{ApiError, AppState, authenticate};
use crate::error::StorageError;
use crate::evidence::model::EvidenceRecord;

pub fn evidence_routes() -> axum::Router<AppState> {
    axum::Router::new().route("/api/evidence/upload", post(upload))
}

struct UploadForm {
    file_bytes: Vec<u8>,
    filename: String,
    content_type: String,
    case_id: Option<String>,
    category: String,
    description: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm {
        file_bytes: Vec::new(),
        filename: "upload".to_string(),
        content_type: "application/octet-stream".to_string(),
        case_id: None,
        category: "evidence".to_string(),
        description: None,
    };
    let mut saw_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::invalid("form", "Malformed multipart body"))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                saw_file = true;
                if let Some(name) = field.file_name() {
                    form.filename = name.to_string();
                }
                if let Some(content_type) = field.content_type() {
                    form.content_type = content_type.to_string();
                }
                form.file_bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::invalid("file", "Failed to read file"))?
                    .to_vec();
            }
            "caseId" => {
                form.case_id = field.text().await.ok();
            }
            "category" => {
                if let Ok(category) = field.text().await
                    && !category.is_empty()
                {
                    form.category = category;
                }
            }
            "description" => {
                form.description = field.text().await.ok().filter(|d| !d.is_empty());
            }
            _ => {}
        }
    }

    if !saw_file || form.file_bytes.is_empty() {
        return Err(ApiError::invalid("file", "File is required"));
    }
    Ok(form)
}

/// POST /api/evidence/upload
async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let form = read_form(multipart).await?;

    let case_id = form
        .case_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| ApiError::invalid("caseId", "caseId is required"))?;

    // Ownership check doubles as existence check: someone else's case looks
    // identical to no case at all.
    state
        .db
        .get_case_for_user(case_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Case not found".to_string()))?;

    let file_path = state
        .storage
        .store(case_id, &form.category, &form.filename, &form.file_bytes)
        .await
        .map_err(|e| match e {
            StorageError::InvalidPath(component) => {
                ApiError::invalid("category", &format!("Invalid path component: {component}"))
            }
            StorageError::Io(e) => {
                error!(case_id = %case_id, error = %e, "Evidence write failed");
                ApiError::Internal
            }
        })?;

    let record = EvidenceRecord {
        id: Uuid::new_v4(),
        case_id,
        user_id: user.id,
        file_size: form.file_bytes.len() as u64,
        file_path,
        file_type: form.content_type,
        description: form.description.unwrap_or_else(|| form.filename.clone()),
        filename: form.filename,
        category: form.category,
        uploaded_at: Utc::now(),
    };
    state.db.insert_evidence(&record).await?;

    Ok(Json(serde_json::json!({ "evidence": record })))
}
