//! External process runner
//!
//! Every program the tool launches (`open`, `unmount`, `unison`) goes
//! through [`ProcessRunner`], so tests can swap in a fake.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, warn};

/// Outcome of running an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// Exited with status 0
    Succeeded,
    /// Exited non-zero, or was killed by a signal (`code` is `None`)
    Failed { code: Option<i32> },
    /// Could not be started at all
    NotLaunched { reason: String },
}

impl CommandStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandStatus::Succeeded)
    }
}

/// Runs a program to completion and reports how it ended
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> CommandStatus;
}

/// Runs real processes, inheriting stdio except stdout
///
/// Child stdout is redirected to our stderr: our stdout belongs to the
/// menu-bar host and anything unison prints there would end up as menu items.
pub struct SystemRunner {
    path: Option<OsString>,
}

impl SystemRunner {
    /// Build a runner whose children see `PATH` extended by `extra_path`
    pub fn new(extra_path: &[String]) -> Self {
        let current = std::env::var_os("PATH");
        Self {
            path: extended_path(current.as_deref(), extra_path),
        }
    }
}

/// Append existing directories from `extra` that are not yet on `current`
pub fn extended_path(current: Option<&std::ffi::OsStr>, extra: &[String]) -> Option<OsString> {
    let mut entries: Vec<PathBuf> = current
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();

    let mut changed = false;
    for dir in extra {
        let dir = Path::new(dir);
        if dir.is_dir() && !entries.iter().any(|e| e == dir) {
            entries.push(dir.to_path_buf());
            changed = true;
        }
    }

    if !changed {
        return None;
    }

    match std::env::join_paths(entries) {
        Ok(joined) => Some(joined),
        Err(e) => {
            warn!("Cannot extend PATH: {}", e);
            None
        }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> CommandStatus {
        debug!("Running: {} {}", program, args.join(" "));

        let mut command = AsyncCommand::new(program);
        command
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(stdout_to_stderr());

        if let Some(path) = &self.path {
            command.env("PATH", path);
        }

        match command.status().await {
            Ok(status) if status.success() => CommandStatus::Succeeded,
            Ok(status) => {
                debug!("{} exited with {}", program, status);
                CommandStatus::Failed {
                    code: status.code(),
                }
            }
            Err(e) => {
                warn!("Failed to execute {}: {}", program, e);
                CommandStatus::NotLaunched {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// A child stdout that writes into our stderr
#[cfg(unix)]
fn stdout_to_stderr() -> std::process::Stdio {
    use std::os::fd::AsFd;
    match std::io::stderr().as_fd().try_clone_to_owned() {
        Ok(fd) => std::process::Stdio::from(fd),
        Err(_) => std::process::Stdio::null(),
    }
}

#[cfg(not(unix))]
fn stdout_to_stderr() -> std::process::Stdio {
    std::process::Stdio::null()
}
