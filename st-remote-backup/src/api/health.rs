//! Health check endpoint.

use super::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

/// GET /health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("[health] ok");

    Json(json!({
        "ok": true,
        "dataDir": state.backups.data_dir().display().to_string(),
        "backupDir": state.backups.backup_dir().display().to_string(),
    }))
}
