//! Credential rotation endpoint.

use super::{auth::parse_basic, AppState, OkResponse};
use crate::credentials::MIN_CREDENTIAL_LEN;
use crate::error::AppError;
use crate::utils::CredentialError;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::Value;

/// POST /change-cred - Replace the credential pair.
///
/// The current pair must be presented as Basic credentials even when
/// authentication is disabled; the body carries `{"user": .., "pass": ..}`.
pub async fn change_credentials(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<OkResponse>, AppError> {
    let presented = match parse_basic(&headers) {
        Some(presented) => presented,
        None => return Err(CredentialError::Mismatch.into()),
    };
    if !state
        .credentials
        .matches(&presented.username, &presented.password)
        .await
    {
        return Err(CredentialError::Mismatch.into());
    }

    let (username, password) = parse_new_credential(&body)?;
    state
        .credentials
        .rotate(
            &presented.username,
            &presented.password,
            &username,
            &password,
        )
        .await?;

    tracing::info!("[change-cred] credentials updated");
    Ok(Json(OkResponse::ok()))
}

fn parse_new_credential(body: &[u8]) -> Result<(String, String), AppError> {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let user = value.get("user").filter(|v| is_present(v));
    let pass = value.get("pass").filter(|v| is_present(v));

    match (user, pass) {
        (Some(Value::String(user)), Some(Value::String(pass))) => Ok((user.clone(), pass.clone())),
        (Some(_), Some(_)) => Err(AppError::BadRequest(format!(
            "new username and password must be strings of at least {MIN_CREDENTIAL_LEN} characters"
        ))),
        _ => Err(AppError::BadRequest(
            "new username and password are required".into(),
        )),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
