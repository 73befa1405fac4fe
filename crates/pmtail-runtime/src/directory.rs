//! Listing the process names the external manager knows about.
//!
//! PM2 has no stable machine-readable listing on every install, so
//! this module shells out to `pm2 list` and parses its box-drawn
//! table. The parsing is deliberately isolated behind
//! [`ServiceDirectory::list_process_names`] so it can be hardened or
//! swapped without touching the streaming core, which only ever sees
//! opaque name strings.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::error::DirectoryError;

/// One-shot listing of managed process names.
pub struct ServiceDirectory {
    pm2_bin: PathBuf,
}

impl ServiceDirectory {
    /// Create a directory backed by the given pm2 binary.
    pub fn new(pm2_bin: impl Into<PathBuf>) -> Self {
        Self {
            pm2_bin: pm2_bin.into(),
        }
    }

    /// Path to the pm2 binary this directory invokes.
    pub fn pm2_bin(&self) -> &Path {
        &self.pm2_bin
    }

    /// Run `pm2 list` and extract the set of process names.
    ///
    /// # Errors
    /// [`DirectoryError::Command`] if the command cannot be run,
    /// [`DirectoryError::Failed`] if it exits unsuccessfully.
    pub async fn list_process_names(&self) -> Result<BTreeSet<String>, DirectoryError> {
        let output = Command::new(&self.pm2_bin)
            .arg("list")
            .output()
            .await
            .map_err(DirectoryError::Command)?;

        if !output.status.success() {
            return Err(DirectoryError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let names = parse_process_table(&String::from_utf8_lossy(&output.stdout));
        debug!(count = names.len(), "listed managed processes");
        Ok(names)
    }
}

/// Parse PM2's box-drawn process table into a set of names.
///
/// Data rows contain `│` column separators; header rows (old and new
/// PM2 layouts) are skipped, as are separator rules, which use other
/// box-drawing characters. The name sits at whitespace-field position
/// 3 (`│ <id> │ <name> │ …`); rows too short to carry one are ignored.
pub fn parse_process_table(table: &str) -> BTreeSet<String> {
    table
        .lines()
        .filter(|line| line.contains('│'))
        .filter(|line| !line.contains("App name") && !line.contains("│ id"))
        .filter_map(|line| {
            line.split_whitespace()
                .nth(3)
                .map(std::string::ToString::to_string)
        })
        .collect()
}
