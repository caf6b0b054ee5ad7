//! Share mounting
//!
//! Mount state is never stored: a share counts as mounted while its mount
//! point exists.

use std::path::Path;
use tracing::{info, warn};

use crate::reachability::Probe;
use crate::runner::{CommandStatus, ProcessRunner};

/// Whether the share is mounted right now
pub fn is_mounted(mount_point: &Path) -> bool {
    mount_point.exists()
}

/// Mounts and unmounts shares through the OS commands
pub struct Mounter<'a> {
    runner: &'a dyn ProcessRunner,
    probe: &'a dyn Probe,
    open_command: &'a str,
    unmount_command: &'a str,
}

impl<'a> Mounter<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        probe: &'a dyn Probe,
        open_command: &'a str,
        unmount_command: &'a str,
    ) -> Self {
        Self {
            runner,
            probe,
            open_command,
            unmount_command,
        }
    }

    /// Ask the OS to mount `uri`, skipping the attempt if its server is down
    pub async fn attempt_mount(&self, uri: &str) -> bool {
        if !self.probe.is_reachable(uri).await {
            warn!("Share not reachable, skipping mount: {}", uri);
            return false;
        }

        info!("Mounting {}", uri);
        let status = self
            .runner
            .run(self.open_command, &[uri.to_string()])
            .await;
        log_status("mount", &status);
        status.is_success()
    }

    /// Ask the OS to unmount `mount_point`
    pub async fn attempt_unmount(&self, mount_point: &Path) -> bool {
        info!("Unmounting {}", mount_point.display());
        let status = self
            .runner
            .run(
                self.unmount_command,
                &[mount_point.to_string_lossy().into_owned()],
            )
            .await;
        log_status("unmount", &status);
        status.is_success()
    }
}

fn log_status(action: &str, status: &CommandStatus) {
    match status {
        CommandStatus::Succeeded => info!("{} succeeded", action),
        CommandStatus::Failed { code } => warn!("{} failed with exit code {:?}", action, code),
        CommandStatus::NotLaunched { reason } => warn!("{} could not start: {}", action, reason),
    }
}
