//! Graceful termination for `tokio::process::Child` with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Default grace period before escalating to SIGKILL.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Terminate a child process, bounded by a grace period.
///
/// # Strategy
/// 1. Send SIGTERM and wait up to `grace` for a clean exit
/// 2. If still running, send SIGKILL
/// 3. Wait for reaping (required to avoid zombies)
///
/// # Platform behavior
/// - Unix: SIGTERM via the nix crate, then SIGKILL via `.kill()`
/// - Windows: immediate `.kill()` (no graceful termination available)
///
/// Safe to call on a child that has already exited: the terminate
/// signal is skipped and the exit status is simply collected.
///
/// # Errors
/// Returns the underlying I/O error if signalling or waiting fails.
pub async fn shutdown_child(mut child: Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(&mut child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        shutdown_windows(&mut child).await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already reaped by a previous wait; collect the status.
        return child.wait().await;
    };

    // Phase 1: SIGTERM, then wait out the grace period.
    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            // Process already exited between id() and kill().
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    // Phase 2: grace expired, escalate. Child::kill sends SIGKILL on Unix.
    child.kill().await?;

    // Phase 3: reap (fast after SIGKILL).
    child.wait().await
}

#[cfg(not(unix))]
async fn shutdown_windows(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[tokio::test]
    #[cfg(unix)]
    async fn sigterm_ends_a_cooperative_child_within_grace() {
        let child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn sleep");

        let start = std::time::Instant::now();
        let result = shutdown_child(child, Duration::from_secs(5)).await;
        assert!(result.is_ok());
        // sleep dies to SIGTERM; no SIGKILL escalation should be needed.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn already_exited_child_is_reaped_without_error() {
        let child = Command::new("echo")
            .arg("test")
            .spawn()
            .expect("failed to spawn echo");

        sleep(Duration::from_millis(100)).await;

        let result = shutdown_child(child, Duration::from_secs(1)).await;
        assert!(result.is_ok());
    }
}
