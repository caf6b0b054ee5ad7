//! Preflight diagnostics for `--doctor`
//!
//! Checks the pieces a scheduled run depends on and reports them in one go,
//! instead of the single glyph the menu shows.

use crate::config::Settings;
use crate::marker::{StopMarker, SyncState};
use crate::mount::is_mounted;
use crate::profile::Profile;
use crate::reachability::Probe;
use crate::runner::{CommandStatus, ProcessRunner};

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Unison binary status
    pub unison: CheckResult,
    /// Unison directory status
    pub unison_dir: CheckResult,
    /// Profile parse status
    pub profile: CheckResult,
    /// Share mount and reachability status
    pub share: CheckResult,
    /// Stop marker status (informational)
    pub sync_state: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::ok(message)
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: true,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::warning(message)
        }
    }
}

impl HealthCheck {
    /// Run all health checks for one profile
    pub async fn run(
        settings: &Settings,
        profile_name: &str,
        runner: &dyn ProcessRunner,
        probe: &dyn Probe,
    ) -> Self {
        let loaded = Profile::load(&settings.profile_path(profile_name));

        let share = match &loaded {
            Ok(profile) => Self::check_share(profile, probe).await,
            Err(_) => CheckResult::warning("Share not checked (profile unavailable)"),
        };

        Self {
            unison: Self::check_unison(settings, runner).await,
            unison_dir: Self::check_unison_dir(settings),
            profile: Self::check_profile(settings, profile_name, &loaded),
            share,
            sync_state: Self::check_sync_state(settings),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.all_checks().iter().all(|(_, r)| r.passed)
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| r.is_warning)
            .collect()
    }

    /// All checks with display names, in report order
    pub fn all_checks(&self) -> Vec<(&'static str, &CheckResult)> {
        vec![
            ("Unison", &self.unison),
            ("Unison directory", &self.unison_dir),
            ("Profile", &self.profile),
            ("Share", &self.share),
            ("Sync state", &self.sync_state),
        ]
    }

    async fn check_unison(settings: &Settings, runner: &dyn ProcessRunner) -> CheckResult {
        let program = &settings.commands.unison;
        match runner.run(program, &["-version".to_string()]).await {
            CommandStatus::Succeeded => CheckResult::ok_with_details("Unison runs", program.clone()),
            CommandStatus::Failed { code } => CheckResult::error_with_details(
                "Unison exited with an error",
                format!("{} -version exited with {:?}", program, code),
            ),
            CommandStatus::NotLaunched { reason } => CheckResult::error_with_details(
                "Unison not found",
                format!("{}: {}\nInstall unison or set commands.unison", program, reason),
            ),
        }
    }

    fn check_unison_dir(settings: &Settings) -> CheckResult {
        let dir = settings.unison_dir();
        if dir.is_dir() {
            CheckResult::ok_with_details("Unison directory exists", dir.display().to_string())
        } else {
            CheckResult::error_with_details(
                "Unison directory missing",
                format!("{} (created on the next scheduled run)", dir.display()),
            )
        }
    }

    fn check_profile(
        settings: &Settings,
        profile_name: &str,
        loaded: &anyhow::Result<Profile>,
    ) -> CheckResult {
        let path = settings.profile_path(profile_name);
        match loaded {
            Ok(profile) => CheckResult::ok_with_details(
                format!("Profile {} loaded", profile_name),
                format!("{} ({} keys)", path.display(), profile.len()),
            ),
            Err(e) => CheckResult::error_with_details(
                format!("Could not load profile {}", profile_name),
                format!("{:#}", e),
            ),
        }
    }

    async fn check_share(profile: &Profile, probe: &dyn Probe) -> CheckResult {
        if !profile.has_mount() {
            return CheckResult::ok("Local profile, nothing to mount");
        }

        let mounted = profile.mount_point.as_deref().map(is_mounted);
        let mount_text = match (&profile.mount_point, mounted) {
            (Some(path), Some(true)) => format!("{} is mounted", path.display()),
            (Some(path), _) => format!("{} is not mounted", path.display()),
            (None, _) => "no mount point configured".to_string(),
        };

        let uri = match &profile.mount_uri {
            Some(uri) => uri,
            None if mounted == Some(true) => return CheckResult::ok(mount_text),
            None => {
                return CheckResult::warning_with_details(
                    "Share not mounted and no mount URI configured",
                    mount_text,
                )
            }
        };

        if probe.is_reachable(uri).await {
            CheckResult::ok_with_details(format!("{} is reachable", uri), mount_text)
        } else {
            CheckResult::warning_with_details(format!("{} is not reachable", uri), mount_text)
        }
    }

    fn check_sync_state(settings: &Settings) -> CheckResult {
        let marker = StopMarker::new(settings.marker_path());
        match marker.state() {
            SyncState::Running => CheckResult::ok("Syncing is enabled"),
            SyncState::Stopped => CheckResult::warning_with_details(
                "Syncing is stopped",
                format!("Marker: {}", marker.path().display()),
            ),
        }
    }
}
