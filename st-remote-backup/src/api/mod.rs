//! HTTP API module for the backup service.

pub mod auth;
pub mod backup;
pub mod credentials;
pub mod health;
pub mod logs;

use crate::archive::TarGzArchiver;
use crate::backup::BackupService;
use crate::config::Config;
use crate::credentials::{Credential, CredentialStore};
use crate::fs::PathFilter;
use crate::logs::LogBuffer;
use axum::extract::DefaultBodyLimit;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: Arc<CredentialStore>,
    pub logs: Arc<LogBuffer>,
    pub backups: Arc<BackupService>,
}

impl AppState {
    /// Build the state from configuration. The credential store starts from
    /// the configured pair; call [`CredentialStore::load`] to apply the file.
    pub fn new(config: Config, logs: Arc<LogBuffer>) -> Self {
        let credentials = CredentialStore::new(
            config.auth.credential_file.clone(),
            Credential::new(config.auth.username.clone(), config.auth.password.clone()),
        );
        let backups = BackupService::new(
            config.storage.data_dir.clone(),
            config.storage.backup_dir.clone(),
            config.storage.archive_prefix.clone(),
            PathFilter::default(),
            Arc::new(TarGzArchiver::new(config.storage.compression_level)),
        );

        Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            logs,
            backups: Arc::new(backups),
        }
    }
}

/// Body of responses that carry nothing but success
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Create the router: Basic-auth guarded API routes plus the unguarded
/// static control panel as fallback
pub fn create_router(state: AppState) -> Router {
    let public_dir = state.config.server.public_dir.clone();
    let body_limit = state.config.server.body_limit;

    Router::new()
        .route("/health", get(health::health))
        .route("/logs", get(logs::read_logs).delete(logs::clear_logs))
        .route("/backup", post(backup::create_backup))
        .route("/list", get(backup::list_backups))
        .route("/restore", post(backup::restore_backup))
        .route("/delete", delete(backup::delete_backup))
        .route("/change-cred", post(credentials::change_credentials))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ))
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
