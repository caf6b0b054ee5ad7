//! Unison profile parsing
//!
//! Unison profiles are `key = value` files. The tool reads its own settings
//! from the same file, hidden in comment lines so unison itself ignores them:
//!
//! ```text
//! root = /Users/me/Documents
//! root = /Volumes/Share/Documents
//! #sync:mountpoint = /Volumes/Share
//! #sync:mounturi = smb://me@nas.local/Share
//! ```

use anyhow::{Context, Result};
use path_clean::PathClean;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Key naming the local mount point of the share
pub const MOUNT_POINT_KEY: &str = "sync:mountpoint";

/// Key naming the URI passed to the OS to mount the share
pub const MOUNT_URI_KEY: &str = "sync:mounturi";

fn parameter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Comment lines are matched too; that is where the sync: keys live
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*#?\s*(\S+)\s*=\s*(.+?)\s*$").expect("profile parameter pattern is valid")
    })
}

/// A parsed unison profile
///
/// Every key maps to the ordered list of values it was given; unison allows
/// repeated keys (`root`, `path`, ...) and all occurrences are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    entries: BTreeMap<String, Vec<String>>,

    /// Where the share appears once mounted
    pub mount_point: Option<PathBuf>,

    /// URI handed to the OS to mount the share
    pub mount_uri: Option<String>,
}

impl Profile {
    /// Load and parse a profile file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile: {:?}", path))?;

        Self::parse(&content)
    }

    /// Parse profile text
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for line in content.lines() {
            if let Some(captures) = parameter_pattern().captures(line) {
                let name = &captures[1];
                let value = &captures[2];
                if name.is_empty() || value.is_empty() {
                    continue;
                }
                entries
                    .entry(name.to_string())
                    .or_default()
                    .push(value.to_string());
            }
        }

        // Only `~` is expanded; `$` is a legal character in volume names
        let mount_point = entries
            .get(MOUNT_POINT_KEY)
            .and_then(|v| v.last())
            .map(|raw| PathBuf::from(shellexpand::tilde(raw).as_ref()).clean());

        let mount_uri = entries.get(MOUNT_URI_KEY).and_then(|v| v.last()).cloned();

        Ok(Self {
            entries,
            mount_point,
            mount_uri,
        })
    }

    /// All values given for a key, in file order
    pub fn values(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The last value given for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values(key).last().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether this profile syncs to a share that has to be mounted first
    pub fn has_mount(&self) -> bool {
        self.mount_point.is_some() || self.mount_uri.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
# Unison preferences
root = /Users/me/Documents
root = /Volumes/Share/Documents

ignore = Name .DS_Store
ignore = Name *.tmp
batch = true

#sync:mountpoint = /Volumes/Share
# sync:mounturi = smb://me@nas.local/Share
# just a comment without assignment
"#;

    #[test]
    fn test_parse_collects_plain_and_commented_keys() {
        let profile = Profile::parse(SAMPLE).unwrap();

        assert_eq!(profile.get("batch"), Some("true"));
        assert_eq!(profile.get(MOUNT_POINT_KEY), Some("/Volumes/Share"));
        assert_eq!(profile.get(MOUNT_URI_KEY), Some("smb://me@nas.local/Share"));
        assert!(!profile.contains_key("just"));
        assert_eq!(profile.len(), 5);
    }

    #[test]
    fn test_repeated_keys_accumulate_in_order() {
        let profile = Profile::parse(SAMPLE).unwrap();

        assert_eq!(
            profile.values("root"),
            &["/Users/me/Documents".to_string(), "/Volumes/Share/Documents".to_string()]
        );
        assert_eq!(profile.values("ignore").len(), 2);
        assert_eq!(profile.get("root"), Some("/Volumes/Share/Documents"));
    }

    #[test]
    fn test_typed_mount_fields() {
        let profile = Profile::parse(SAMPLE).unwrap();

        assert_eq!(profile.mount_point, Some(PathBuf::from("/Volumes/Share")));
        assert_eq!(profile.mount_uri.as_deref(), Some("smb://me@nas.local/Share"));
        assert!(profile.has_mount());
    }

    #[test]
    fn test_last_mount_point_wins_and_is_cleaned() {
        let profile = Profile::parse(
            "#sync:mountpoint = /Volumes/Old\n#sync:mountpoint = /Volumes/New/../Share/\n",
        )
        .unwrap();

        assert_eq!(profile.mount_point, Some(PathBuf::from("/Volumes/Share")));
        assert_eq!(profile.values(MOUNT_POINT_KEY).len(), 2);
    }

    #[test]
    fn test_dollar_in_mount_point_is_kept_literally() {
        let profile = Profile::parse("#sync:mountpoint = /Volumes/$Backup\n").unwrap();
        assert_eq!(profile.mount_point, Some(PathBuf::from("/Volumes/$Backup")));

        let profile = Profile::parse("#sync:mountpoint = /Volumes/Data$1\n").unwrap();
        assert_eq!(profile.mount_point, Some(PathBuf::from("/Volumes/Data$1")));
    }

    #[test]
    fn test_tilde_in_mount_point_is_expanded() {
        let profile = Profile::parse("#sync:mountpoint = ~/Shares/NAS\n").unwrap();
        let mount_point = profile.mount_point.unwrap();

        assert!(mount_point.ends_with("Shares/NAS"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(mount_point, home.join("Shares/NAS").clean());
        }
    }

    #[test]
    fn test_local_profile_has_no_mount() {
        let profile = Profile::parse("root = /a\nroot = /b\n").unwrap();

        assert!(profile.mount_point.is_none());
        assert!(profile.mount_uri.is_none());
        assert!(!profile.has_mount());
    }

    #[test]
    fn test_values_are_trimmed_and_keep_inner_spaces() {
        let profile = Profile::parse("  ignore   =   Name foo bar   \n").unwrap();
        assert_eq!(profile.get("ignore"), Some("Name foo bar"));
    }

    #[test]
    fn test_lines_without_value_are_ignored() {
        let profile = Profile::parse("key =\n= value\n   \n#\n").unwrap();
        assert!(profile.is_empty());
    }

    #[test]
    fn test_value_may_contain_equals_sign() {
        let profile = Profile::parse("sshargs = -o Option=yes\n").unwrap();
        assert_eq!(profile.get("sshargs"), Some("-o Option=yes"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Profile::load(Path::new("/nonexistent/profile.prf"));
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to read profile"));
    }

    #[test]
    fn test_load_twice_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("default.conf");
        std::fs::write(&path, SAMPLE).unwrap();

        let first = Profile::load(&path).unwrap();
        let second = Profile::load(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_rejects_non_utf8_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.prf");
        std::fs::write(&path, [0x72, 0x6f, 0x6f, 0x74, 0x3d, 0xff, 0xfe]).unwrap();

        assert!(Profile::load(&path).is_err());
    }

    #[quickcheck]
    fn prop_parsing_is_deterministic(lines: Vec<(String, String)>) -> bool {
        let content: String = lines
            .iter()
            .map(|(k, v)| format!("{} = {}\n", k, v))
            .collect();

        match (Profile::parse(&content), Profile::parse(&content)) {
            (Ok(a), Ok(b)) => a == b,
            (Err(_), Err(_)) => true,
            _ => false,
        }
    }

    #[quickcheck]
    fn prop_repeated_key_keeps_every_value(values: Vec<u32>) -> bool {
        let content: String = values.iter().map(|v| format!("root = {}\n", v)).collect();
        let profile = match Profile::parse(&content) {
            Ok(profile) => profile,
            Err(_) => return false,
        };

        let expected: Vec<String> = values.iter().map(u32::to_string).collect();
        profile.values("root") == expected.as_slice()
    }
}
