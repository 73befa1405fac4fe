//! Route definitions and router construction.

use axum::Router;
use axum::routing::get;
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::bootstrap::{AxumContext, CorsConfig, into_state};
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// API routes shared by both router flavors.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/config", get(handlers::config::get))
        .route("/services", get(handlers::services::list))
        .route("/logs", get(handlers::logs::stream))
}

/// Create the main router, serving the embedded viewer page at `/`.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let cors = build_cors_layer(cors_config);

    api_routes()
        .route("/", get(handlers::home::page))
        .with_state(into_state(ctx))
        .layer(cors)
}

/// Create a router serving a static frontend build instead of the
/// embedded page. Unmatched paths fall back to the directory's
/// `index.html`.
pub fn create_spa_router<P: AsRef<Path>>(
    ctx: AxumContext,
    static_dir: P,
    cors_config: &CorsConfig,
) -> Router {
    let static_path = static_dir.as_ref();
    let index_path = static_path.join("index.html");
    let serve_dir = ServeDir::new(static_path).fallback(ServeFile::new(&index_path));

    let cors = build_cors_layer(cors_config);

    api_routes()
        .with_state(into_state(ctx))
        .layer(cors)
        .fallback_service(serve_dir)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
