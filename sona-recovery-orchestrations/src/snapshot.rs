//! Local file backing the configuration snapshot
//!
//! A single well-known path is used for the whole run. Two runs against the
//! same host would share it, so callers must serialize runs themselves.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default snapshot file name, relative to the working directory
pub const DEFAULT_SNAPSHOT_PATH: &str = "network-cfg.json";

/// Exported node configuration, read back for restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove any snapshot left by an earlier run
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Replace the snapshot with `bytes`. Never appends or merges.
    pub fn replace(&self, bytes: &[u8]) -> io::Result<()> {
        self.clear()?;
        fs::write(&self.path, bytes)
    }

    /// A snapshot is usable only if the file exists and is non-empty
    pub fn validate(&self) -> bool {
        fs::metadata(&self.path)
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    pub fn size(&self) -> u64 {
        fs::metadata(&self.path).map(|meta| meta.len()).unwrap_or(0)
    }

    pub fn read(&self) -> io::Result<ConfigSnapshot> {
        Ok(ConfigSnapshot {
            path: self.path.clone(),
            bytes: fs::read(&self.path)?,
        })
    }

    /// Delete the snapshot. Returns whether a file was removed.
    pub fn purge(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Guard that purges the snapshot when the run ends, whichever way it ends
    pub fn guard(&self) -> SnapshotGuard {
        SnapshotGuard {
            store: self.clone(),
            armed: true,
        }
    }
}

/// Purges the snapshot exactly once: explicitly through [`SnapshotGuard::purge`],
/// or on drop if the run unwound before reaching it.
#[derive(Debug)]
pub struct SnapshotGuard {
    store: SnapshotStore,
    armed: bool,
}

impl SnapshotGuard {
    pub fn purge(mut self) -> io::Result<bool> {
        self.armed = false;
        self.store.purge()
    }
}

impl Drop for SnapshotGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.store.purge() {
            tracing::warn!(path = %self.store.path().display(), error = %e, "Failed to purge snapshot");
        }
    }
}
