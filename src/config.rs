use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tool settings, loaded once per invocation and shared read-only
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Directory holding unison profiles and the stop marker
    #[serde(default = "default_unison_directory")]
    pub unison_directory: String,

    /// File name of the stop marker inside the unison directory
    #[serde(default = "default_stop_marker")]
    pub stop_marker: String,

    /// Well-known port per share URI scheme
    #[serde(default = "default_ports")]
    pub ports: BTreeMap<String, u16>,

    /// Reachability probe connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// External commands
    #[serde(default)]
    pub commands: CommandConfig,

    /// Directories appended to PATH for child processes
    #[serde(default = "default_extra_path")]
    pub extra_path: Vec<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Names of the external programs the tool shells out to
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CommandConfig {
    /// Opens a share URI (mounts it)
    #[serde(default = "default_open_command")]
    pub open: String,

    /// Unmounts a mount point
    #[serde(default = "default_unmount_command")]
    pub unmount: String,

    /// The unison binary
    #[serde(default = "default_unison_command")]
    pub unison: String,

    /// Extra arguments passed to unison after the profile name
    #[serde(default)]
    pub unison_args: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_unison_directory() -> String {
    "~/.unison".to_string()
}
fn default_stop_marker() -> String {
    "unison-sync.stopped".to_string()
}
fn default_ports() -> BTreeMap<String, u16> {
    BTreeMap::from([("smb".to_string(), 139), ("afp".to_string(), 548)])
}
fn default_connect_timeout_ms() -> u64 {
    2000
}
fn default_open_command() -> String {
    "open".to_string()
}
fn default_unmount_command() -> String {
    "unmount".to_string()
}
fn default_unison_command() -> String {
    "unison".to_string()
}
fn default_extra_path() -> Vec<String> {
    vec!["/usr/local/bin".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            open: default_open_command(),
            unmount: default_unmount_command(),
            unison: default_unison_command(),
            unison_args: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            unison_directory: default_unison_directory(),
            stop_marker: default_stop_marker(),
            ports: default_ports(),
            connect_timeout_ms: default_connect_timeout_ms(),
            commands: CommandConfig::default(),
            extra_path: default_extra_path(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults.
    ///
    /// Nothing is written when the file is absent: the tool runs every few
    /// minutes from a menu-bar host and must not leave files behind.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No settings at {:?}, using defaults", config_path);
            let mut settings = Self::default();
            settings.expand_paths()?;
            Ok(settings)
        }
    }

    /// Load settings from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;

        let mut settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;

        settings.expand_paths()?;

        Ok(settings)
    }

    /// Get the default settings file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("unison-sync").join("config.yml"))
    }

    /// Expand `~` and environment variables in configured paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.unison_directory = shellexpand::full(&self.unison_directory)
            .context("Failed to expand unison_directory path")?
            .into_owned();

        for dir in &mut self.extra_path {
            *dir = shellexpand::full(dir.as_str())
                .context("Failed to expand extra_path entry")?
                .into_owned();
        }

        Ok(())
    }

    pub fn unison_dir(&self) -> PathBuf {
        PathBuf::from(&self.unison_directory)
    }

    /// Full path of the stop marker file
    pub fn marker_path(&self) -> PathBuf {
        self.unison_dir().join(&self.stop_marker)
    }

    /// Resolve a profile argument against the unison directory
    pub fn profile_path(&self, profile: &str) -> PathBuf {
        let candidate = Path::new(profile);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.unison_dir().join(candidate)
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Create the unison directory if it does not exist yet
    pub fn ensure_unison_dir(&self) -> Result<()> {
        let dir = self.unison_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create unison directory: {:?}", dir))?;
            tracing::info!("Created unison directory: {}", dir.display());
        }
        Ok(())
    }
}
