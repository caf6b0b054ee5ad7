//! Sync orchestration
//!
//! One invocation performs one [`Action`], then reports a [`RunReport`] for
//! the menu. Nothing is remembered between invocations except the stop
//! marker: mount state and sync eligibility are derived from the file
//! system every time, so the menu-bar host can call us on a timer without
//! ever waiting on a mount in progress.

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::marker::{StopMarker, SyncState};
use crate::mount::{is_mounted, Mounter};
use crate::profile::{Profile, MOUNT_URI_KEY};
use crate::reachability::Probe;
use crate::runner::ProcessRunner;

/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Only mount the share
    Mount,
    /// Only unmount the share
    Unmount,
    /// Pause syncing
    Stop,
    /// Resume syncing
    Restart,
    /// Scheduled run: mount if needed, otherwise sync
    Run,
}

impl Action {
    /// Pick the action from CLI flags; mount > unmount > stop > restart
    pub fn from_flags(mount: bool, unmount: bool, stop: bool, restart: bool) -> Self {
        if mount {
            Action::Mount
        } else if unmount {
            Action::Unmount
        } else if stop {
            Action::Stop
        } else if restart {
            Action::Restart
        } else {
            Action::Run
        }
    }
}

/// Result of a unison invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Unison was not run this time
    NotAttempted,
    Succeeded,
    Failed,
}

/// State to render after an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub profile: String,
    pub action: Action,
    /// Whether the profile names a share at all
    pub mount_configured: bool,
    pub mounted: bool,
    pub state: SyncState,
    pub sync: SyncOutcome,
    /// A mount was attempted during this invocation
    pub mount_attempted: bool,
}

impl RunReport {
    pub fn stopped(&self) -> bool {
        self.state.is_stopped()
    }

    pub fn synced(&self) -> bool {
        self.sync == SyncOutcome::Succeeded
    }
}

/// Runs one invocation against injected settings and collaborators
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    runner: &'a dyn ProcessRunner,
    probe: &'a dyn Probe,
    marker: StopMarker,
}

impl<'a> Orchestrator<'a> {
    pub fn new(settings: &'a Settings, runner: &'a dyn ProcessRunner, probe: &'a dyn Probe) -> Self {
        Self {
            settings,
            runner,
            probe,
            marker: StopMarker::new(settings.marker_path()),
        }
    }

    /// Resolve and load a profile by name
    pub fn load_profile(&self, profile: &str) -> Result<Profile> {
        let path = self.settings.profile_path(profile);
        debug!("Loading profile {}", path.display());
        Profile::load(&path).with_context(|| format!("Could not load profile {}", profile))
    }

    /// Load the profile and perform `action`
    pub async fn run(&self, profile_name: &str, action: Action) -> Result<RunReport> {
        let profile = self.load_profile(profile_name)?;
        self.execute(profile_name, &profile, action).await
    }

    /// Perform `action` for an already loaded profile
    pub async fn execute(
        &self,
        profile_name: &str,
        profile: &Profile,
        action: Action,
    ) -> Result<RunReport> {
        let mounter = Mounter::new(
            self.runner,
            self.probe,
            &self.settings.commands.open,
            &self.settings.commands.unmount,
        );

        let mut state = self.marker.state();
        // Local-only profiles have nothing to mount and count as mounted
        let mut mounted = profile
            .mount_point
            .as_deref()
            .map(is_mounted)
            .unwrap_or(true);
        let mut sync = SyncOutcome::NotAttempted;
        let mut mount_attempted = false;

        debug!(
            "Profile {}: state={:?} mounted={} action={:?}",
            profile_name, state, mounted, action
        );

        match action {
            Action::Mount => {
                if let (Some(uri), false) = (profile.mount_uri.as_deref(), mounted) {
                    mount_attempted = true;
                    mounted = mounter.attempt_mount(uri).await;
                }
            }
            Action::Unmount => {
                if let (Some(mount_point), true) = (profile.mount_point.as_deref(), mounted) {
                    mounted = !mounter.attempt_unmount(mount_point).await;
                }
            }
            Action::Stop => {
                state = self.marker.stop()?;
            }
            Action::Restart => {
                state = self.marker.restart()?;
            }
            Action::Run if state.is_stopped() => {
                info!("Sync is stopped, skipping {}", profile_name);
            }
            Action::Run => {
                match (profile.mount_uri.as_deref(), mounted) {
                    (Some(uri), false) => {
                        // Mounting is asynchronous on the OS side; sync on the next run
                        mount_attempted = true;
                        if mounter.attempt_mount(uri).await {
                            info!("Mount requested for {}, sync deferred to next run", uri);
                        }
                    }
                    (_, true) => {
                        sync = self.attempt_sync(profile_name).await;
                    }
                    (None, false) => {
                        warn!("Mount point missing and no {} to mount it from", MOUNT_URI_KEY);
                    }
                }
            }
        }

        Ok(RunReport {
            profile: profile_name.to_string(),
            action,
            mount_configured: profile.has_mount(),
            mounted,
            state,
            sync,
            mount_attempted,
        })
    }

    /// Run `unison <profile>`
    async fn attempt_sync(&self, profile_name: &str) -> SyncOutcome {
        let mut args = vec![profile_name.to_string()];
        args.extend(self.settings.commands.unison_args.iter().cloned());

        info!("Syncing profile {}", profile_name);
        let start_time = Instant::now();
        let status = self.runner.run(&self.settings.commands.unison, &args).await;

        if status.is_success() {
            info!(
                "Sync of {} completed in {:.2}s",
                profile_name,
                start_time.elapsed().as_secs_f64()
            );
            SyncOutcome::Succeeded
        } else {
            warn!("Sync of {} failed: {:?}", profile_name, status);
            SyncOutcome::Failed
        }
    }
}
