pub mod health;
pub mod resume;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resume/normalize", post(resume::handle_normalize))
        .route("/api/v1/resume/import", post(resume::handle_import))
        .route("/api/v1/resume/export", post(resume::handle_export))
        .route("/api/v1/resume/backup", post(resume::handle_backup))
        .route("/api/v1/resume/classify", post(resume::handle_classify))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
