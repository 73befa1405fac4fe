//! Process runtime for pmtail.
//!
//! This crate owns every OS-process concern of the log bridge:
//!
//! - [`LogTail`] spawns the long-running `pm2 logs … --raw` child and
//!   exposes its stdout.
//! - [`LineReader`] turns that byte stream into discrete log lines.
//! - [`shutdown_child`] terminates a child with a bounded grace period.
//! - [`ServiceDirectory`] lists the process names PM2 currently knows.
//!
//! The web adapter (`pmtail-axum`) composes these per connection; no
//! state in this crate is shared across sessions.

#![deny(unsafe_code)]

pub mod directory;
pub mod error;
pub mod lines;
pub mod shutdown;
pub mod tail;

pub use directory::{ServiceDirectory, parse_process_table};
pub use error::{DirectoryError, ReadError, TailError};
pub use lines::{DEFAULT_MAX_LINE_BYTES, LineReader};
pub use shutdown::{DEFAULT_SHUTDOWN_GRACE, shutdown_child};
pub use tail::{LogTail, StreamScope};
