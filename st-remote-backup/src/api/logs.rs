//! Read and clear the in-memory operational log.

use super::{AppState, OkResponse};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

/// Lines returned when no `limit` is given
pub const DEFAULT_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub ok: bool,
    pub lines: Vec<String>,
}

/// GET /logs?limit=N - Most recent lines, oldest first
pub async fn read_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<LogsResponse> {
    let limit = query
        .limit
        .as_deref()
        .and_then(parse_limit)
        .unwrap_or(DEFAULT_LIMIT);

    let lines = state
        .logs
        .read(limit)
        .into_iter()
        .map(|line| line.to_string())
        .collect();

    Json(LogsResponse { ok: true, lines })
}

/// Leading integer of `raw`; values past `usize::MAX` saturate so they are
/// capped at the buffer capacity
fn parse_limit(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    let digits = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    match raw[..digits].parse::<usize>() {
        Ok(limit) => Some(limit),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(usize::MAX),
        Err(_) => None,
    }
}

/// DELETE /logs - Drop every buffered line
pub async fn clear_logs(State(state): State<AppState>) -> Json<OkResponse> {
    state.logs.clear();
    Json(OkResponse::ok())
}
