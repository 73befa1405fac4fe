//! Error types for the process runtime.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Failure to start a log-tailing subprocess.
///
/// Both variants are session-fatal: the caller must tear the session
/// down without attempting to read.
#[derive(Debug, Error)]
pub enum TailError {
    /// The external command could not be launched (binary missing,
    /// permission denied, …).
    #[error("failed to spawn log tail command: {0}")]
    Spawn(#[source] io::Error),

    /// The child was spawned but its stdout handle was not available.
    #[error("log tail child has no stdout pipe")]
    Pipe,
}

/// I/O failure while reading subprocess output.
///
/// Not retried; the session reading the stream ends.
#[derive(Debug, Error)]
#[error("failed to read from log stream: {0}")]
pub struct ReadError(#[from] pub io::Error);

/// Failure to list process names from the external manager.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The listing command could not be run.
    #[error("failed to run listing command: {0}")]
    Command(#[source] io::Error),

    /// The listing command ran but exited unsuccessfully.
    #[error("listing command failed with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}
