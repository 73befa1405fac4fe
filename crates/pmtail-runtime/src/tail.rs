//! Log-tailing subprocess management.
//!
//! [`LogTail`] builds and spawns the external `pm2 logs … --raw`
//! command for a [`StreamScope`] and hands the caller the child handle
//! plus its stdout. The caller owns both: it drives the stdout stream
//! (usually through [`crate::lines::LineReader`]) and must eventually
//! reap the child, normally via [`crate::shutdown::shutdown_child`].

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use crate::error::TailError;

/// Sentinel query value meaning "all processes".
pub const ALL_SERVICES: &str = "all";

/// Which process's logs a session tails.
///
/// Immutable for the lifetime of one session. A service name is passed
/// through to PM2 unchecked; an unknown name simply yields a silent
/// stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamScope {
    /// Tail the combined logs of every managed process.
    All,
    /// Tail one named process.
    Service(String),
}

impl StreamScope {
    /// Map the raw `service` query parameter onto a scope.
    ///
    /// Absence, an empty value, and the literal `"all"` all mean the
    /// wildcard scope.
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some(ALL_SERVICES) => Self::All,
            Some(name) => Self::Service(name.to_string()),
        }
    }
}

impl fmt::Display for StreamScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_SERVICES),
            Self::Service(name) => f.write_str(name),
        }
    }
}

/// A running log-tailing child process and its output stream.
pub struct LogTail {
    /// The child process. Never shared across sessions.
    pub child: Child,
    /// The child's stdout handle, valid for the child's lifetime.
    pub stdout: ChildStdout,
}

impl LogTail {
    /// Spawn `pm2 logs [name] --raw` for the given scope.
    ///
    /// The child is started exactly once per call, with stdout piped
    /// and stdin/stderr nulled. Stderr is deliberately not captured:
    /// the bridge only forwards stdout, and an undrained stderr pipe
    /// would eventually stall the child.
    ///
    /// # Errors
    /// [`TailError::Spawn`] if the command cannot be launched,
    /// [`TailError::Pipe`] if the stdout handle is unavailable.
    pub fn spawn(pm2_bin: &Path, scope: &StreamScope) -> Result<Self, TailError> {
        let mut cmd = Command::new(pm2_bin);
        cmd.args(tail_args(scope))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            // Last-resort cleanup if the owning session is dropped
            // without running its teardown.
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(TailError::Spawn)?;
        let stdout = child.stdout.take().ok_or(TailError::Pipe)?;

        debug!(pid = ?child.id(), %scope, "spawned log tail child");
        Ok(Self { child, stdout })
    }
}

/// Argument vector for the tail command, minus the binary itself.
fn tail_args(scope: &StreamScope) -> Vec<OsString> {
    let mut args = vec![OsString::from("logs")];
    if let StreamScope::Service(name) = scope {
        args.push(OsString::from(name));
    }
    args.push(OsString::from("--raw"));
    args
}
