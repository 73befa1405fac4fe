//! WebSocket upgrade handler for the log stream.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use pmtail_runtime::StreamScope;

use crate::session;
use crate::state::AppState;

/// Query parameters of `GET /logs`.
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    /// Process name to tail; absent, empty, or `all` means every
    /// managed process.
    pub service: Option<String>,
}

/// `GET /logs?service=<name|all>` — upgrade and stream log lines.
///
/// A request that is not a valid WebSocket upgrade is rejected by the
/// extractor with a client-error response before any session exists.
pub async fn stream(
    ws: WebSocketUpgrade,
    Query(query): Query<LogsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let scope = StreamScope::from_query(query.service.as_deref());
    let settings = state.stream.clone();
    ws.on_upgrade(move |socket| session::run(socket, scope, settings))
}
