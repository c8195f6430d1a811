mod console;
mod control;
mod login;
mod notify;
mod probe;
mod reconcile;
mod settings;
mod status;
mod token;

use clap::{Parser, Subcommand};
use control::Controller;
use notify::DesktopNotifier;
use probe::{PgrepProbe, Probe};
use reconcile::{GatewayState, Monitor};
use settings::Settings;
use status::SnapshotFile;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Supervises the local OpenClaw gateway process: polls its liveness,
/// notifies on state changes, and exposes start/stop/restart plus
/// shortcuts to the gateway's web console and logs.
#[derive(Parser, Debug)]
#[command(name = "openclaw-monitor", version, about)]
struct Cli {
    /// Settings file path (default: ~/.openclaw/monitor.toml)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the supervision loop until interrupted (the default)
    Watch,
    /// Probe once and print the gateway state
    Status,
    /// Start the gateway as a detached background process
    Start,
    /// Stop the gateway
    Stop,
    /// Restart the gateway
    Restart,
    /// Open the authenticated web console
    Dashboard,
    /// Open the web console without authentication
    Open,
    /// Open the gateway log file
    Logs,
    /// Launch-at-login registration
    Login {
        #[command(subcommand)]
        action: LoginAction,
    },
}

#[derive(Subcommand, Debug)]
enum LoginAction {
    /// Register the monitor to start at login
    On,
    /// Unregister the monitor
    Off,
    /// Print the current registration state
    Status,
}

enum LifecycleAction {
    Start,
    Stop,
    Restart,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "openclaw_monitor=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let settings = match cli.settings.or_else(Settings::default_path) {
        Some(path) => Settings::load(&path),
        None => {
            tracing::warn!("could not determine home directory, using default settings");
            Settings::default()
        }
    };

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&settings).await,
        Command::Status => print_status().await,
        Command::Start => lifecycle(&settings, LifecycleAction::Start).await,
        Command::Stop => lifecycle(&settings, LifecycleAction::Stop).await,
        Command::Restart => lifecycle(&settings, LifecycleAction::Restart).await,
        Command::Dashboard => console::open_dashboard(&settings, &DesktopNotifier),
        Command::Open => console::open_gateway(&settings),
        Command::Logs => console::view_logs(&settings),
        Command::Login { action } => match action {
            LoginAction::On => login::set_enabled(true),
            LoginAction::Off => login::set_enabled(false),
            LoginAction::Status => {
                let state = if login::is_enabled() {
                    "enabled"
                } else {
                    "disabled"
                };
                println!("launch at login: {state}");
            }
        },
    }
}

/// The supervision loop: poll every `poll.interval_secs`, notify the
/// operator on transitions, refresh the status snapshot on every check.
/// Runs until Ctrl-C; no individual failure ever stops the loop.
async fn watch(settings: &Settings) {
    let snapshot_path = SnapshotFile::default_path()
        .unwrap_or_else(|| std::env::temp_dir().join("openclaw-monitor.status"));
    let mut monitor = Monitor::new(PgrepProbe, DesktopNotifier, SnapshotFile::new(snapshot_path));

    let interval = Duration::from_secs(settings.poll.interval_secs.max(1));
    let (_recheck_tx, recheck_rx) = mpsc::channel(8);

    tracing::info!(interval_secs = interval.as_secs(), "watching gateway");
    tokio::select! {
        _ = monitor.run(interval, recheck_rx) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
        }
    }
    monitor.cleanup();
}

/// One-shot probe plus whatever the running monitor last recorded.
async fn print_status() {
    let state = GatewayState::from_running(PgrepProbe.is_running().await);
    println!("gateway: {state}");

    let Some(path) = SnapshotFile::default_path() else {
        return;
    };
    match SnapshotFile::new(path).read() {
        Ok(Some(snap)) => {
            println!(
                "monitor: pid {}, {} checks, last update {}",
                snap.pid,
                snap.checks,
                snap.last_update.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if let Some(change) = snap.last_change {
                println!("last change: {}", change.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "could not read monitor snapshot"),
    }
}

/// Issue one lifecycle action, then report the observed state after each
/// scheduled recheck. The recheck channel closes once the last delayed
/// task has fired, which for restart covers both the stop settle and the
/// relaunch settle.
async fn lifecycle(settings: &Settings, action: LifecycleAction) {
    let (tx, mut rx) = mpsc::channel(8);
    let controller = Controller::new(settings.gateway.clone(), tx);
    match action {
        LifecycleAction::Start => controller.start(),
        LifecycleAction::Stop => controller.stop().await,
        LifecycleAction::Restart => controller.restart().await,
    }
    drop(controller);

    while rx.recv().await.is_some() {
        let state = GatewayState::from_running(PgrepProbe.is_running().await);
        println!("gateway: {state}");
    }
}
