//! Backup endpoints: create, list, restore, delete.

use super::{AppState, OkResponse};
use crate::backup::BackupArchive;
use crate::error::AppError;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameBody {
    name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateBackupResponse {
    pub ok: bool,
    pub file: String,
}

#[derive(Debug, Serialize)]
pub struct ListBackupsResponse {
    pub ok: bool,
    pub items: Vec<BackupArchive>,
}

/// POST /backup - Archive the data directory
pub async fn create_backup(
    State(state): State<AppState>,
) -> Result<Json<CreateBackupResponse>, AppError> {
    let created = state.backups.create().await?;
    Ok(Json(CreateBackupResponse {
        ok: true,
        file: created.name,
    }))
}

/// GET /list - Archives, newest first
pub async fn list_backups(
    State(state): State<AppState>,
) -> Result<Json<ListBackupsResponse>, AppError> {
    let items = state.backups.list().await?;
    Ok(Json(ListBackupsResponse { ok: true, items }))
}

/// POST /restore?name=X (or body `{"name": X}`) - Extract over the data directory
pub async fn restore_backup(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
    body: Bytes,
) -> Result<Json<OkResponse>, AppError> {
    let name = query
        .name
        .filter(|n| !n.is_empty())
        .or_else(|| {
            serde_json::from_slice::<NameBody>(&body)
                .ok()
                .and_then(|b| b.name)
        })
        .unwrap_or_default();

    state.backups.restore(&name).await?;
    Ok(Json(OkResponse::ok()))
}

/// DELETE /delete?name=X - Remove an archive
pub async fn delete_backup(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<OkResponse>, AppError> {
    let name = query.name.unwrap_or_default();
    state.backups.delete(&name).await?;
    Ok(Json(OkResponse::ok()))
}
