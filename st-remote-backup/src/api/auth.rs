//! HTTP Basic authentication for API routes.

use super::AppState;
use crate::credentials::Credential;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

/// Credentials from an `Authorization: Basic ...` header. Anything
/// malformed counts as no credentials.
pub fn parse_basic(headers: &HeaderMap) -> Option<Credential> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, payload) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(payload.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credential::new(username, password))
}

/// Middleware guarding every API route. Passes everything through while no
/// credentials are configured.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = parse_basic(request.headers());
    if state.credentials.authorize(presented.as_ref()).await {
        return next.run(request).await;
    }

    tracing::debug!("Rejected {} {}", request.method(), request.uri().path());
    unauthorized(&state.config.auth.realm)
}

fn unauthorized(realm: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{realm}\""))],
        Json(json!({ "ok": false, "error": "Unauthorized" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_parse_basic() {
        // admin:hunter2
        let parsed = parse_basic(&headers_with("Basic YWRtaW46aHVudGVyMg==")).unwrap();
        assert_eq!(parsed, Credential::new("admin", "hunter2"));

        // Scheme is case-insensitive
        assert!(parse_basic(&headers_with("basic YWRtaW46aHVudGVyMg==")).is_some());
    }

    #[test]
    fn test_password_may_contain_colons() {
        // user:pa:ss
        let parsed = parse_basic(&headers_with("Basic dXNlcjpwYTpzcw==")).unwrap();
        assert_eq!(parsed, Credential::new("user", "pa:ss"));
    }

    #[test]
    fn test_empty_pair() {
        // ":"
        let parsed = parse_basic(&headers_with("Basic Og==")).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_malformed_headers() {
        assert!(parse_basic(&HeaderMap::new()).is_none());
        assert!(parse_basic(&headers_with("Bearer abc")).is_none());
        assert!(parse_basic(&headers_with("Basic !!!not-base64")).is_none());
        // "nocolon"
        assert!(parse_basic(&headers_with("Basic bm9jb2xvbg==")).is_none());
    }
}
