//! Menu-bar plugin output
//!
//! BitBar-style hosts run the plugin on a timer and turn its stdout into a
//! menu: the first line is the title, `---` starts the dropdown, and every
//! following line is an item. `bash=... paramN=...` makes an item re-run us
//! with extra arguments when clicked.

use std::path::PathBuf;

use crate::orchestrator::RunReport;

pub const GLYPH_ERROR: &str = ":exclamation:";
pub const GLYPH_INACTIVE: &str = ":no_entry_sign:";
pub const GLYPH_SYNCED: &str = ":heavy_check_mark:";
pub const GLYPH_NOT_SYNCED: &str = ":heavy_multiplication_x:";

const SEPARATOR: &str = "---";

/// Renders menus that call back into a given executable
#[derive(Debug, Clone)]
pub struct MenuRenderer {
    executable: PathBuf,
}

impl MenuRenderer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Renderer for the running binary
    pub fn for_current_exe() -> Self {
        let executable = std::env::current_exe()
            .and_then(|p| p.canonicalize())
            .unwrap_or_else(|_| PathBuf::from(env!("CARGO_PKG_NAME")));
        Self::new(executable)
    }

    /// Title glyph for a finished run
    pub fn status_glyph(report: &RunReport) -> &'static str {
        if report.stopped() || !report.mounted {
            GLYPH_INACTIVE
        } else if report.synced() {
            GLYPH_SYNCED
        } else {
            GLYPH_NOT_SYNCED
        }
    }

    /// Full menu for a finished run
    pub fn render(&self, report: &RunReport) -> String {
        let mut out = header(Self::status_glyph(report));

        if report.mount_configured {
            if report.mounted {
                out.push_str(&self.action_line("Unmount", &report.profile, "--unmount"));
            } else {
                out.push_str(&self.action_line("Mount", &report.profile, "--mount"));
            }
        }

        if report.stopped() {
            out.push_str(&self.action_line("Restart", &report.profile, "--restart"));
        } else {
            out.push_str(&self.action_line("Stop", &report.profile, "--stop"));
        }

        out.push_str(&retry_line());
        out
    }

    /// Menu for a run that could not get going
    pub fn render_error(&self, message: &str) -> String {
        let mut out = header(GLYPH_ERROR);
        for line in message.lines() {
            // A pipe would start item parameters
            out.push_str(&line.replace('|', "/"));
            out.push('\n');
        }
        out.push_str(&retry_line());
        out
    }

    fn action_line(&self, label: &str, profile: &str, flag: &str) -> String {
        format!(
            "{} | refresh=true terminal=false bash=\"{}\" param1=\"{}\" param2={}\n",
            label,
            self.executable.display(),
            profile,
            flag
        )
    }
}

/// Title line followed by the dropdown separator
fn header(glyph: &str) -> String {
    format!("{}\n{}\n", glyph, SEPARATOR)
}

fn retry_line() -> String {
    "Retry | refresh=true\n".to_string()
}
