use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use unison_sync::health::CheckResult;
use unison_sync::{
    Action, HealthCheck, MenuRenderer, Orchestrator, Settings, SystemRunner, TcpProbe,
};

#[derive(Parser)]
#[command(name = "unison-sync")]
#[command(about = "Attempt to mount a file share and run Unison")]
#[command(version)]
struct Cli {
    /// Name of Unison profile
    #[arg(value_name = "PROFILE", default_value = "default.conf")]
    profile: String,

    /// Only mount share
    #[arg(long)]
    mount: bool,

    /// Only unmount share
    #[arg(long)]
    unmount: bool,

    /// Stop syncing
    #[arg(long)]
    stop: bool,

    /// Restart syncing
    #[arg(long)]
    restart: bool,

    /// Print a diagnostics report instead of the menu
    #[arg(long)]
    doctor: bool,

    /// Settings file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let renderer = MenuRenderer::for_current_exe();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(cli.verbose, "info")?;
            error!("{:#}", e);
            print!("{}", renderer.render_error("Could not load settings"));
            return Ok(());
        }
    };

    init_logging(cli.verbose, &settings.logging.level)?;
    debug!("Starting unison-sync v{}", env!("CARGO_PKG_VERSION"));

    let runner = SystemRunner::new(&settings.extra_path);
    let probe = TcpProbe::from_settings(&settings);

    if cli.doctor {
        let health = HealthCheck::run(&settings, &cli.profile, &runner, &probe).await;
        print_health_report(&health);
        return Ok(());
    }

    if let Err(e) = settings.ensure_unison_dir() {
        error!("{:#}", e);
        print!("{}", renderer.render_error(&e.to_string()));
        return Ok(());
    }

    let action = Action::from_flags(cli.mount, cli.unmount, cli.stop, cli.restart);
    let orchestrator = Orchestrator::new(&settings, &runner, &probe);

    // Failures end up in the menu, not the exit status: the host only shows stdout
    match orchestrator.run(&cli.profile, action).await {
        Ok(report) => {
            debug!("Run report: {:?}", report);
            print!("{}", renderer.render(&report));
        }
        Err(e) => {
            error!("{:#}", e);
            print!("{}", renderer.render_error(&e.to_string()));
        }
    }

    Ok(())
}

/// Initialize logging on stderr; stdout carries the menu
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(filter)
        .init();

    Ok(())
}

/// Load settings from specified path or default location
fn load_settings(config_path: Option<&std::path::Path>) -> Result<Settings> {
    match config_path {
        Some(path) => Settings::load(path),
        None => Settings::load_or_default(),
    }
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning { "⚠️ " } else { "✅" }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 unison-sync Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    if health.all_passed() {
        println!("✅ All checks passed");
    } else {
        println!("❌ Some checks failed");
    }
}
