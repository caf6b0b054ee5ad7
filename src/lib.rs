//! unison-sync - menu-bar status plugin for unison
//!
//! A poor man's Dropbox: the menu-bar host (BitBar, xbar, SwiftBar) runs this
//! tool on a timer. Each run mounts the network share a unison profile syncs
//! to if needed, otherwise runs `unison <profile>`, and prints a status menu.
//!
//! ## Modules
//!
//! - [`config`]: Tool settings and their defaults
//! - [`profile`]: Unison profile parsing, including the `sync:` keys
//! - [`reachability`]: TCP probe of a share's file server
//! - [`runner`]: External process seam
//! - [`mount`]: Mount and unmount actions
//! - [`marker`]: Stop marker state machine
//! - [`orchestrator`]: Per-invocation decision logic
//! - [`menu`]: Menu-bar output
//! - [`health`]: `--doctor` diagnostics

pub mod config;
pub mod health;
pub mod marker;
pub mod menu;
pub mod mount;
pub mod orchestrator;
pub mod profile;
pub mod reachability;
pub mod runner;

pub use config::Settings;
pub use health::HealthCheck;
pub use marker::{StopMarker, SyncState};
pub use menu::MenuRenderer;
pub use orchestrator::{Action, Orchestrator, RunReport, SyncOutcome};
pub use profile::Profile;
pub use reachability::{Probe, TcpProbe};
pub use runner::{CommandStatus, ProcessRunner, SystemRunner};
