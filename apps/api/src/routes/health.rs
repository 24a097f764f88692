use axum::Json;
use serde_json::{json, Value};

use crate::codec::extensions::SCHEMA_VERSION;

/// GET /health
/// Returns a simple status object with service and backup schema versions.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "schemaVersion": SCHEMA_VERSION
    }))
}
