//! The per-connection log streaming session.
//!
//! One session binds one upgraded WebSocket to one `pm2 logs`
//! subprocess and its line reader. The subprocess is never shared and
//! the socket is never reused; both are released together.
//!
//! ## Lifecycle
//!
//! 1. **Open** — the upgrade already succeeded (the handler rejected
//!    the request otherwise). The tail child is spawned; a spawn
//!    failure is logged once, the socket is closed, and nothing is
//!    streamed.
//! 2. **Streaming** — two supervised tasks run against the split
//!    socket:
//!    * *forward* drives the [`LineReader`] and sends each line as one
//!      text message, in arrival order, no batching;
//!    * *client watch* drains inbound frames so a Close frame or a
//!      transport error is noticed even while the source is silent.
//! 3. **Teardown** — `tokio::select!` joins the pair; whichever task
//!    finishes first aborts the other, so a departed client promptly
//!    cancels a reader blocked on subprocess output. The child is then
//!    terminated with a bounded grace period and reaped. Abort on an
//!    already-finished task and shutdown of an already-dead child are
//!    both no-ops, so overlapping triggers (client close racing
//!    subprocess exit) cannot double-release anything.
//!
//! A write failure means the client is gone: nothing is reported back,
//! the reason is recorded for diagnostics only. Read failures and EOF
//! end the stream with a close handshake toward the client.

use std::path::PathBuf;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use pmtail_runtime::{LineReader, LogTail, StreamScope, shutdown_child};

/// Per-session stream settings, fixed at bootstrap.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Path to (or name of) the pm2 binary.
    pub pm2_bin: PathBuf,
    /// Grace period for subprocess teardown before force-kill.
    pub shutdown_grace: Duration,
    /// Cap on a single forwarded log line, in bytes.
    pub max_line_bytes: usize,
}

/// Why the streaming phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The client sent a Close frame or its transport dropped.
    ClientClosed,
    /// A send was rejected mid-stream; the client is gone.
    WriteFailed,
    /// The subprocess closed its output (normal exit).
    SourceEof,
    /// Reading the subprocess output failed.
    ReadFailed,
}

/// Run one streaming session to completion.
///
/// Consumes the upgraded socket; returns once every resource (socket,
/// subprocess, reader buffers, tasks) has been released.
pub async fn run(mut socket: WebSocket, scope: StreamScope, settings: SessionSettings) {
    info!(%scope, "log stream session opened");

    let tail = match LogTail::spawn(&settings.pm2_bin, &scope) {
        Ok(tail) => tail,
        Err(e) => {
            // Session-fatal; recorded once for the operator, nothing
            // streamed to the client.
            warn!(%scope, error = %e, "could not start log tail, closing session");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    let LogTail { child, stdout } = tail;
    let mut reader = LineReader::new(stdout, settings.max_line_bytes);

    // Split the socket so the two tasks can use it concurrently.
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // ── Client watch: notice disconnects while the source is quiet ──
    let mut client_watch = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                // Ignore ping/pong and any unexpected inbound frames.
                Ok(_) => {}
            }
        }
    });

    // ── Forward: subprocess lines → text messages, in order ─────────
    let mut forward = tokio::spawn(async move {
        let end = loop {
            match reader.next_line().await {
                Ok(Some(line)) => {
                    if ws_sender.send(Message::Text(line.into())).await.is_err() {
                        break SessionEnd::WriteFailed;
                    }
                }
                Ok(None) => break SessionEnd::SourceEof,
                Err(e) => {
                    warn!(error = %e, "log stream read failed");
                    break SessionEnd::ReadFailed;
                }
            }
        };
        if end != SessionEnd::WriteFailed {
            // The client may still be listening; finish the close
            // handshake so it observes a clean end of stream.
            let _ = ws_sender.close().await;
        }
        end
    });

    // Join whichever path ends the session first; abort the other.
    let end = tokio::select! {
        _ = &mut client_watch => {
            forward.abort();
            SessionEnd::ClientClosed
        }
        res = &mut forward => {
            client_watch.abort();
            res.unwrap_or(SessionEnd::WriteFailed)
        }
    };

    // Terminate the subprocess, bounded by the grace period, and reap
    // it. A child that already exited (EOF path) is just collected.
    match shutdown_child(child, settings.shutdown_grace).await {
        Ok(status) if !status.success() => {
            debug!(%status, "log tail exited with non-zero status")
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "failed to shut down log tail child"),
    }

    info!(%scope, reason = ?end, "log stream session closed");
}
