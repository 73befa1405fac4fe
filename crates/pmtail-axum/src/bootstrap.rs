//! Server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired
//! together for the web adapter. Configuration arrives as an explicit
//! [`ServerConfig`]; nothing here reads the environment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use pmtail_runtime::{DEFAULT_MAX_LINE_BYTES, DEFAULT_SHUTDOWN_GRACE, ServiceDirectory};

use crate::session::SessionSettings;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the web adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// Path to (or name of) the pm2 binary.
    pub pm2_bin: PathBuf,
    /// Advertised WebSocket URL returned by `/config`. When unset,
    /// defaults to `ws://localhost:<port>/logs`.
    pub websocket_url: Option<String>,
    /// Grace period for subprocess teardown before force-kill.
    pub shutdown_grace: Duration,
    /// Cap on a single forwarded log line, in bytes.
    pub max_line_bytes: usize,
    /// Optional path to static assets to serve instead of the
    /// embedded viewer page.
    pub static_dir: Option<PathBuf>,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Create config with default values.
    pub fn with_defaults() -> Self {
        Self {
            port: 9192,
            pm2_bin: PathBuf::from("pm2"),
            websocket_url: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            static_dir: None,
            cors: CorsConfig::default(),
        }
    }

    /// Set the static directory to serve instead of the embedded page.
    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }

    /// The WebSocket URL advertised to browsers via `/config`.
    pub fn advertised_ws_url(&self) -> String {
        self.websocket_url
            .clone()
            .unwrap_or_else(|| format!("ws://localhost:{}/logs", self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Application context for the web adapter.
///
/// Holds everything handlers need: the directory collaborator, the
/// per-session stream settings, and the advertised endpoint. Read-only
/// after startup; sessions own all their mutable state themselves.
pub struct AxumContext {
    /// Process-name listing collaborator.
    pub directory: ServiceDirectory,
    /// Settings handed to each streaming session.
    pub stream: SessionSettings,
    /// WebSocket URL advertised via `/config`.
    pub websocket_url: String,
}

/// Assemble the application context from configuration.
pub fn bootstrap(config: &ServerConfig) -> AxumContext {
    AxumContext {
        directory: ServiceDirectory::new(config.pm2_bin.clone()),
        stream: SessionSettings {
            pm2_bin: config.pm2_bin.clone(),
            shutdown_grace: config.shutdown_grace,
            max_line_bytes: config.max_line_bytes,
        },
        websocket_url: config.advertised_ws_url(),
    }
}

/// Start the web server on the configured port, serving forever.
///
/// If `config.static_dir` is set, serves those assets with an index
/// fallback instead of the embedded viewer page.
///
/// # Errors
/// Fails fast if the listen port cannot be bound.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config);

    let app = if let Some(ref static_dir) = config.static_dir {
        info!("serving static assets from: {}", static_dir.display());
        crate::routes::create_spa_router(ctx, static_dir, &config.cors)
    } else {
        crate::routes::create_router(ctx, &config.cors)
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("pmtail web server listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Arc the context into the shared handler state.
pub(crate) fn into_state(ctx: AxumContext) -> crate::state::AppState {
    Arc::new(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertised_url_defaults_to_localhost_logs_endpoint() {
        let config = ServerConfig::with_defaults();
        assert_eq!(config.advertised_ws_url(), "ws://localhost:9192/logs");
    }

    #[test]
    fn advertised_url_override_wins() {
        let config = ServerConfig {
            websocket_url: Some("wss://logs.example.com/logs".to_string()),
            ..ServerConfig::with_defaults()
        };
        assert_eq!(config.advertised_ws_url(), "wss://logs.example.com/logs");
    }
}
