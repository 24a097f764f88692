//! Axum route handlers for the résumé codec.
//!
//! Bodies are taken as raw JSON values (or raw text for imports) and always go
//! through the normalizer, so malformed editor state never fails a request.

use axum::{extract::State, Json};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::codec::encode::EncodeOptions;
use crate::codec::extensions::ExtendedDocument;
use crate::codec::import::{export_backup, export_clean, import_text, Imported, ReviewSummary};
use crate::codec::normalize::normalize;
use crate::codec::schema::{classify, SchemaClassification};
use crate::errors::AppError;
use crate::models::resume::{CanonicalResume, CleanResume};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub resume: CanonicalResume,
    pub review: ReviewSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/normalize
///
/// Returns the fully populated canonical model plus the review counts.
pub async fn handle_normalize(Json(raw): Json<Value>) -> Json<NormalizeResponse> {
    let resume = normalize(&raw);
    let review = ReviewSummary::of(&resume);
    Json(NormalizeResponse { resume, review })
}

/// POST /api/v1/resume/import
///
/// Accepts the raw file contents. Extended backups are validated and
/// restored; plain payloads are normalized.
pub async fn handle_import(body: Bytes) -> Result<Json<Imported>, AppError> {
    let raw = std::str::from_utf8(&body)
        .map_err(|e| AppError::Validation(format!("request body is not valid UTF-8: {e}")))?;
    if raw.trim().is_empty() {
        return Err(AppError::Validation("request body is empty".to_string()));
    }
    Ok(Json(import_text(raw)?))
}

/// POST /api/v1/resume/export
///
/// Standards-compatible payload with every visibility field removed.
pub async fn handle_export(Json(raw): Json<Value>) -> Json<CleanResume> {
    Json(export_clean(&normalize(&raw)))
}

/// POST /api/v1/resume/backup
///
/// Extended document that restores visibility on import.
pub async fn handle_backup(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Json<ExtendedDocument> {
    let options = EncodeOptions {
        exported_by: state.config.exporter_id.clone(),
        ..Default::default()
    };
    Json(export_backup(&normalize(&raw), &options))
}

/// POST /api/v1/resume/classify
///
/// Reports whether a document is an extended backup this service can restore.
pub async fn handle_classify(Json(candidate): Json<Value>) -> Json<SchemaClassification> {
    Json(classify(&candidate))
}
