//! Configuration blob handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /config`: where the browser should open its stream.
#[derive(Debug, Serialize)]
pub struct StreamConfig {
    pub websocket_url: String,
}

/// `GET /config` — the advertised WebSocket endpoint.
pub async fn get(State(state): State<AppState>) -> Json<StreamConfig> {
    Json(StreamConfig {
        websocket_url: state.websocket_url.clone(),
    })
}
