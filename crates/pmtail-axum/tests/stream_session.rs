//! End-to-end tests for the WebSocket log stream.
//!
//! Each test boots the real router on an ephemeral port, points it at
//! a fabricated pm2 executable, and drives the stream with a plain
//! WebSocket client.

#![cfg(unix)]

use std::fs;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use pmtail_axum::bootstrap::{CorsConfig, ServerConfig, bootstrap};
use pmtail_axum::routes::create_router;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn fake_pm2(dir: &TempDir, script: &str) -> PathBuf {
    let path = dir.path().join("pm2");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn test_config(pm2_bin: PathBuf) -> ServerConfig {
    ServerConfig {
        pm2_bin,
        // Keep teardown fast so disconnect tests stay snappy.
        shutdown_grace: Duration::from_secs(1),
        ..ServerConfig::with_defaults()
    }
}

/// Serve the router on an ephemeral local port.
async fn spawn_app(config: &ServerConfig) -> SocketAddr {
    let app = create_router(bootstrap(config), &CorsConfig::AllowAll);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn connect(addr: SocketAddr, query: &str) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/logs{query}"))
        .await
        .expect("websocket upgrade should succeed");
    ws
}

/// Next text frame, failing the test on timeout.
async fn next_text(ws: &mut WsClient) -> String {
    loop {
        let msg = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended unexpectedly")
            .expect("transport error");
        match msg {
            Message::Text(text) => return text.to_string(),
            Message::Close(_) => panic!("stream closed while expecting a line"),
            _ => {}
        }
    }
}

/// True once `kill -0` stops succeeding for the PID.
fn process_is_dead(pid: &str) -> bool {
    !std::process::Command::new("kill")
        .args(["-0", pid])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

async fn read_pidfile(path: &Path) -> String {
    for _ in 0..50 {
        if let Ok(contents) = fs::read_to_string(path) {
            let trimmed = contents.trim().to_string();
            if !trimmed.is_empty() {
                return trimmed;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("pid file was never written");
}

#[tokio::test]
async fn wildcard_stream_delivers_lines_in_order() {
    let dir = TempDir::new().unwrap();
    let pm2 = fake_pm2(
        &dir,
        "#!/bin/sh\necho 'app1: started'\necho 'app2: ready'\nexec sleep 30\n",
    );
    let addr = spawn_app(&test_config(pm2)).await;

    let mut ws = connect(addr, "?service=all").await;
    assert_eq!(next_text(&mut ws).await, "app1: started");
    assert_eq!(next_text(&mut ws).await, "app2: ready");
}

#[tokio::test]
async fn absent_service_parameter_also_streams() {
    let dir = TempDir::new().unwrap();
    let pm2 = fake_pm2(&dir, "#!/bin/sh\necho 'hello'\nexec sleep 30\n");
    let addr = spawn_app(&test_config(pm2)).await;

    let mut ws = connect(addr, "").await;
    assert_eq!(next_text(&mut ws).await, "hello");
}

#[tokio::test]
async fn unknown_service_stays_open_with_zero_messages() {
    // Scope is passed through unchecked: the tail command runs but
    // produces nothing, and the session simply stays quiet.
    let dir = TempDir::new().unwrap();
    let pm2 = fake_pm2(&dir, "#!/bin/sh\nexec sleep 30\n");
    let addr = spawn_app(&test_config(pm2)).await;

    let mut ws = connect(addr, "?service=no-such-app").await;
    let quiet = timeout(Duration::from_millis(300), ws.next()).await;
    assert!(quiet.is_err(), "expected no frame from a silent source");
}

#[tokio::test]
async fn source_eof_closes_the_session() {
    let dir = TempDir::new().unwrap();
    let pm2 = fake_pm2(&dir, "#!/bin/sh\necho 'only line'\n");
    let addr = spawn_app(&test_config(pm2)).await;

    let mut ws = connect(addr, "?service=all").await;
    assert_eq!(next_text(&mut ws).await, "only line");

    // After subprocess EOF the server finishes the close handshake.
    let end = timeout(RECV_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(end.is_ok(), "session did not close after source EOF");
}

#[tokio::test]
async fn missing_binary_closes_immediately_with_no_lines() {
    let addr = spawn_app(&test_config(PathBuf::from("/nonexistent/pm2"))).await;

    let mut ws = connect(addr, "?service=all").await;
    let end = timeout(RECV_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    panic!("unexpected line from failed spawn: {text}")
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(end.is_ok(), "session did not close after spawn failure");
}

#[tokio::test]
async fn racing_client_close_and_source_exit_is_idempotent() {
    // Both teardown triggers at once: the tail child EOFs immediately
    // while the client closes right away. Double-triggered teardown
    // must not wedge or crash the server.
    let dir = TempDir::new().unwrap();
    let pm2 = fake_pm2(&dir, "#!/bin/sh\nexit 0\n");
    let addr = spawn_app(&test_config(pm2.clone())).await;

    for _ in 0..20 {
        let mut ws = connect(addr, "?service=all").await;
        let _ = ws.close(None).await;
        drop(ws);
    }

    // The server must still accept and run a fresh session.
    fs::write(&pm2, "#!/bin/sh\necho 'still alive'\nexec sleep 30\n").unwrap();
    let mut ws = connect(addr, "?service=all").await;
    assert_eq!(next_text(&mut ws).await, "still alive");
}

#[tokio::test]
async fn client_disconnect_tears_down_the_subprocess() {
    let dir = TempDir::new().unwrap();
    let pidfile = dir.path().join("tail.pid");
    let script = format!(
        "#!/bin/sh\necho $$ > '{}'\necho 'line 1'\necho 'line 2'\necho 'line 3'\nexec sleep 100\n",
        pidfile.display()
    );
    let pm2 = fake_pm2(&dir, &script);
    let addr = spawn_app(&test_config(pm2)).await;

    let mut ws = connect(addr, "?service=all").await;
    for expected in ["line 1", "line 2", "line 3"] {
        assert_eq!(next_text(&mut ws).await, expected);
    }

    let pid = read_pidfile(&pidfile).await;
    assert!(!process_is_dead(&pid), "tail child should be alive mid-stream");

    // Disconnect mid-stream; the remaining output is never sent and
    // the subprocess must die within the teardown bound.
    ws.close(None).await.unwrap();
    drop(ws);

    let mut dead = false;
    for _ in 0..50 {
        if process_is_dead(&pid) {
            dead = true;
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    assert!(dead, "tail child survived client disconnect");
}
