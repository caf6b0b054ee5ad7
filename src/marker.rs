//! Stop marker - the only state the tool persists between runs
//!
//! Syncing is paused while the marker file exists. `stop` creates it,
//! `restart` removes it; both are idempotent.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Whether scheduled runs may sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Running,
    Stopped,
}

impl SyncState {
    pub fn is_stopped(self) -> bool {
        self == SyncState::Stopped
    }
}

/// Handle on the stop marker file
#[derive(Debug, Clone)]
pub struct StopMarker {
    path: PathBuf,
}

impl StopMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state, read from disk
    pub fn state(&self) -> SyncState {
        if self.path.exists() {
            SyncState::Stopped
        } else {
            SyncState::Running
        }
    }

    /// Pause syncing
    pub fn stop(&self) -> Result<SyncState> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)
                    .context("Failed to create stop marker directory")?;
            }

            fs::File::create(&self.path)
                .with_context(|| format!("Failed to write stop marker: {}", self.path.display()))?;

            info!("Sync stopped, marker written: {}", self.path.display());
        }

        Ok(SyncState::Stopped)
    }

    /// Resume syncing
    pub fn restart(&self) -> Result<SyncState> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove stop marker: {}", self.path.display()))?;
            info!("Sync restarted, marker removed: {}", self.path.display());
        }

        Ok(SyncState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_initial_state_is_running() {
        let temp_dir = tempdir().unwrap();
        let marker = StopMarker::new(temp_dir.path().join("unison-sync.stopped"));

        assert_eq!(marker.state(), SyncState::Running);
        assert!(!marker.path().exists());
    }

    #[test]
    fn test_stop_then_restart_round_trip() {
        let temp_dir = tempdir().unwrap();
        let marker = StopMarker::new(temp_dir.path().join("unison-sync.stopped"));

        assert_eq!(marker.stop().unwrap(), SyncState::Stopped);
        assert_eq!(marker.state(), SyncState::Stopped);
        assert!(marker.path().exists());

        assert_eq!(marker.restart().unwrap(), SyncState::Running);
        assert_eq!(marker.state(), SyncState::Running);
        assert!(!marker.path().exists());
    }

    #[test]
    fn test_stop_twice_leaves_one_marker() {
        let temp_dir = tempdir().unwrap();
        let marker = StopMarker::new(temp_dir.path().join("unison-sync.stopped"));

        marker.stop().unwrap();
        marker.stop().unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(marker.state(), SyncState::Stopped);
    }

    #[test]
    fn test_restart_when_running_is_noop() {
        let temp_dir = tempdir().unwrap();
        let marker = StopMarker::new(temp_dir.path().join("unison-sync.stopped"));

        assert_eq!(marker.restart().unwrap(), SyncState::Running);
        assert_eq!(marker.state(), SyncState::Running);
    }

    #[test]
    fn test_marker_is_empty_file() {
        let temp_dir = tempdir().unwrap();
        let marker = StopMarker::new(temp_dir.path().join("sub").join("paused"));

        marker.stop().unwrap();
        assert_eq!(fs::metadata(marker.path()).unwrap().len(), 0);
    }
}
