use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::codec::import::ImportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Import(#[from] ImportError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Import(err) => {
                let (status, code) = match err {
                    ImportError::Parse { .. } => (StatusCode::BAD_REQUEST, "PARSE_ERROR"),
                    ImportError::UnsupportedVersion { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "UNSUPPORTED_SCHEMA_VERSION")
                    }
                    ImportError::InvalidExtension { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_EXTENSION")
                    }
                    ImportError::UnsupportedFormat(_) => {
                        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
                    }
                };
                tracing::warn!("Import rejected: {err}");
                (status, code, err.to_string())
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::Import(err) = &self {
            error["details"] = json!(err.errors());
            // The fallback lets the editor open the raw text for manual review.
            if let ImportError::Parse { fallback, .. } = err {
                error["fallback"] = json!(fallback);
            }
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
