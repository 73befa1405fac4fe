//! Axum web adapter for pmtail.
//!
//! Exposes the PM2 log bridge over HTTP: an embedded viewer page, a
//! JSON configuration blob, a process listing, and the WebSocket log
//! stream. The streaming session in [`session`] is the core; the rest
//! is thin request/response glue over `pmtail-runtime`.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

// Re-export primary types
pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, bootstrap, start_server};
pub use error::HttpError;
pub use routes::{create_router, create_spa_router};
pub use state::AppState;
