//! Process listing handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::error::HttpError;
use crate::state::AppState;

/// One managed process, as the frontend expects it.
#[derive(Debug, Serialize)]
pub struct ServiceEntry {
    pub name: String,
}

/// `GET /services` — names of the processes PM2 currently manages.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ServiceEntry>>, HttpError> {
    let names = state.directory.list_process_names().await?;
    Ok(Json(
        names.into_iter().map(|name| ServiceEntry { name }).collect(),
    ))
}
