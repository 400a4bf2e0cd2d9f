use crate::utils::{BackupError, CredentialError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Already logged by `BackupService`
    #[error(transparent)]
    Backup(BackupError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<BackupError> for AppError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::InvalidName(m) => AppError::BadRequest(m),
            other => AppError::Backup(other),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Mismatch => {
                AppError::Unauthorized(CredentialError::Mismatch.to_string())
            }
            CredentialError::Invalid(m) => AppError::BadRequest(m),
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            AppError::Backup(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "ok": false, "error": msg }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{layer::LogBufferLayer, LogBuffer};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (
                BackupError::InvalidName("name required".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                BackupError::Io {
                    context: "Failed to delete",
                    path: PathBuf::from("/b/x.tar.gz"),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (CredentialError::Mismatch.into(), StatusCode::UNAUTHORIZED),
            (
                CredentialError::Invalid("too short".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_internal_error_surfaces_message() {
        let err: AppError = BackupError::Io {
            context: "Failed to delete",
            path: PathBuf::from("/b/x.tar.gz"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert!(err.to_string().starts_with("Failed to delete /b/x.tar.gz"));
    }

    #[test]
    fn test_backup_failures_are_not_logged_again() {
        let buffer = Arc::new(LogBuffer::new(10, 0));
        let subscriber = tracing_subscriber::registry().with(LogBufferLayer::new(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let backup: AppError = BackupError::Io {
                context: "Failed to delete",
                path: PathBuf::from("/b/x.tar.gz"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .into();
            assert_eq!(
                backup.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
            assert!(buffer.is_empty());

            let persist: AppError = CredentialError::Persist {
                path: PathBuf::from("/ro/cred.json"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }
            .into();
            let _ = persist.into_response();
        });

        let lines = buffer.read(10);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].message.contains("/ro/cred.json"));
    }
}
