//! pmtail entry point - the composition root.
//!
//! This is the only place that reads the environment: `.env` via
//! dotenvy, the documented `WEBSOCKET_URL` override, and the CLI
//! flags. Everything downstream receives an explicit `ServerConfig`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use pmtail_axum::{ServerConfig, start_server};

/// Stream PM2 process logs to browsers over WebSockets.
#[derive(Parser, Debug)]
#[command(name = "pmtail", version, about)]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 9192)]
    port: u16,

    /// Path to (or name of) the pm2 binary.
    #[arg(long, default_value = "pm2")]
    pm2_bin: PathBuf,

    /// Serve a frontend build from this directory instead of the
    /// embedded viewer page.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Grace period, in seconds, before a session's log subprocess is
    /// force-killed during teardown.
    #[arg(long, default_value_t = 5)]
    grace_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    if dotenvy::dotenv().is_err() {
        tracing::debug!("no .env file loaded");
    }

    let cli = Cli::parse();

    let config = ServerConfig {
        port: cli.port,
        pm2_bin: cli.pm2_bin,
        // WEBSOCKET_URL is the one documented env knob: the stream
        // endpoint advertised to browsers via /config.
        websocket_url: std::env::var("WEBSOCKET_URL").ok(),
        shutdown_grace: Duration::from_secs(cli.grace_secs),
        static_dir: cli.static_dir,
        ..ServerConfig::with_defaults()
    };

    start_server(config).await
}
