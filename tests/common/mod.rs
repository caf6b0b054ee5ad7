/// Common test utilities and helpers for unison-sync tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use unison_sync::{CommandStatus, Probe, ProcessRunner, Settings};

/// A unison directory in a temp dir plus settings pointing at it
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub unison_dir: PathBuf,
    pub settings: Settings,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let unison_dir = temp_dir.path().join(".unison");
        std::fs::create_dir_all(&unison_dir).expect("Failed to create unison dir");

        let mut settings = Settings::default();
        settings.unison_directory = unison_dir.to_string_lossy().into_owned();

        Self {
            temp_dir,
            unison_dir,
            settings,
        }
    }

    pub fn write_profile(&self, name: &str, content: &str) -> PathBuf {
        let path = self.unison_dir.join(name);
        std::fs::write(&path, content).expect("Failed to write test profile");
        path
    }

    /// A mount point inside the temp dir that does not exist yet
    pub fn mount_point(&self) -> PathBuf {
        self.temp_dir.path().join("Volumes").join("Share")
    }

    pub fn share_profile(&self, mount_point: &Path, uri: &str) -> String {
        format!(
            "root = /Users/me/Documents\nroot = {}/Documents\n#sync:mountpoint = {}\n#sync:mounturi = {}\n",
            mount_point.display(),
            mount_point.display(),
            uri
        )
    }

    pub fn marker_exists(&self) -> bool {
        self.settings.marker_path().exists()
    }
}

/// Records every command and answers with a per-program status
#[derive(Default)]
pub struct FakeRunner {
    statuses: HashMap<String, CommandStatus>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, program: &str, status: CommandStatus) -> Self {
        self.statuses.insert(program.to_string(), status);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|(program, _)| program).collect()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> CommandStatus {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((program.to_string(), args.to_vec()));
        self.statuses
            .get(program)
            .cloned()
            .unwrap_or(CommandStatus::Succeeded)
    }
}

/// Probe with a fixed answer that counts how often it was asked
pub struct FakeProbe {
    reachable: bool,
    asked: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("probe lock poisoned").clone()
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn is_reachable(&self, uri: &str) -> bool {
        self.asked
            .lock()
            .expect("probe lock poisoned")
            .push(uri.to_string());
        self.reachable
    }
}
