//! Status snapshot file: the monitor's live state, written as JSON on
//! every check so `openclaw-monitor status` (and anything else) can read
//! it without talking to the running monitor.
//!
//! Uses atomic write pattern: write to temp file then rename.

use crate::reconcile::GatewayState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The JSON payload written on every reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// PID of the monitor process that wrote the snapshot.
    pub pid: u32,
    /// Gateway state as of the last check.
    pub state: GatewayState,
    /// Total checks performed since the monitor started.
    pub checks: u64,
    /// When the state last changed (None until the first transition).
    pub last_change: Option<DateTime<Utc>>,
    /// When the snapshot was written.
    pub last_update: DateTime<Utc>,
}

/// Manages the snapshot file lifecycle.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Default snapshot location: `~/.openclaw/monitor.status`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".openclaw").join("monitor.status"))
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Atomically write the snapshot.
    ///
    /// Writes to a temporary file in the same directory, then renames,
    /// so readers never see a partial write.
    pub fn write(&self, snapshot: &StatusSnapshot) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| SnapshotError::Serialize { source: e })?;

        let dir = self.path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| SnapshotError::Write {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let tmp_path = dir.join(format!(".monitor.status.tmp.{}", std::process::id()));

        std::fs::write(&tmp_path, json.as_bytes()).map_err(|e| SnapshotError::Write {
            path: tmp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&tmp_path, &self.path).map_err(|e| SnapshotError::Rename {
            from: tmp_path,
            to: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }

    /// Read a snapshot back, if one exists.
    pub fn read(&self) -> Result<Option<StatusSnapshot>, SnapshotError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SnapshotError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        let snapshot =
            serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Parse { source: e })?;
        Ok(Some(snapshot))
    }

    /// Remove the snapshot file (on clean shutdown).
    pub fn remove(&self) {
        let _ = std::fs::remove_file(&self.path);
    }

    /// Path to the snapshot file.
    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Errors from snapshot file operations.
#[derive(Debug)]
pub enum SnapshotError {
    Serialize {
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        source: serde_json::Error,
    },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Serialize { source } => {
                write!(f, "failed to serialize status snapshot: {source}")
            }
            SnapshotError::Write { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            SnapshotError::Rename { from, to, source } => {
                write!(
                    f,
                    "failed to rename {} -> {}: {source}",
                    from.display(),
                    to.display()
                )
            }
            SnapshotError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            SnapshotError::Parse { source } => {
                write!(f, "failed to parse status snapshot: {source}")
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Serialize { source } | SnapshotError::Parse { source } => Some(source),
            SnapshotError::Write { source, .. }
            | SnapshotError::Rename { source, .. }
            | SnapshotError::Read { source, .. } => Some(source),
        }
    }
}
