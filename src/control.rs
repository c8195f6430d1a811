//! Gateway lifecycle actions: start, stop, restart.
//!
//! Every action is fire-and-forget from the caller's perspective. OS
//! command failures are logged and swallowed; the only feedback channel
//! is the delayed [`Recheck`] each action schedules, which lets the poll
//! loop observe whatever actually happened once the process table has
//! settled.

use crate::probe::GATEWAY_PATTERN;
use crate::settings::GatewaySettings;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;

/// How long to wait after start/stop before re-probing, so the OS process
/// table reflects the change.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// How long restart waits after stop before relaunching. Strictly longer
/// than [`SETTLE_DELAY`] to bias toward the old process having exited
/// first. Best effort only — no exit confirmation is performed.
pub const RESTART_DELAY: Duration = Duration::from_secs(3);

/// Message asking the poll loop to probe ahead of schedule.
#[derive(Debug, Clone, Copy)]
pub struct Recheck;

/// Issues lifecycle commands and schedules the follow-up rechecks.
///
/// Cloneable so restart can hand a copy to its delayed relaunch task.
/// Rapid consecutive actions may leave several delayed rechecks pending
/// at once; that is fine, probes are idempotent.
#[derive(Clone)]
pub struct Controller {
    gateway: GatewaySettings,
    recheck_tx: mpsc::Sender<Recheck>,
    kill_program: &'static str,
}

impl Controller {
    pub fn new(gateway: GatewaySettings, recheck_tx: mpsc::Sender<Recheck>) -> Self {
        Self {
            gateway,
            recheck_tx,
            kill_program: "pkill",
        }
    }

    /// Launch the gateway detached, with stdout/stderr appended to the
    /// gateway log file, then schedule a recheck.
    pub fn start(&self) {
        match self.spawn_gateway() {
            Ok(()) => tracing::info!(binary = %self.gateway.binary, "gateway start command issued"),
            Err(e) => tracing::error!(error = %e, "failed to start gateway"),
        }
        self.schedule_recheck(SETTLE_DELAY);
    }

    fn spawn_gateway(&self) -> Result<(), ControlError> {
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.gateway.log_file)
            .map_err(|e| ControlError::LogFile {
                path: self.gateway.log_file.clone(),
                source: e,
            })?;
        let log_err = log.try_clone().map_err(|e| ControlError::LogFile {
            path: self.gateway.log_file.clone(),
            source: e,
        })?;

        // New process group so the gateway survives this process exiting.
        // The Child handle is dropped without waiting; the runtime reaps it.
        let child = Command::new(&self.gateway.binary)
            .arg("gateway")
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .process_group(0)
            .spawn()
            .map_err(|e| ControlError::Spawn {
                binary: self.gateway.binary.clone(),
                source: e,
            })?;
        drop(child);
        Ok(())
    }

    /// Signal every process matching the gateway pattern, then schedule a
    /// recheck. Waits for signal delivery only, not for the gateway to
    /// actually exit.
    pub async fn stop(&self) {
        match Command::new(self.kill_program)
            .arg("-f")
            .arg(GATEWAY_PATTERN)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) if status.success() => {
                tracing::info!("gateway stop signal sent");
            }
            Ok(status) => {
                tracing::info!(code = ?status.code(), "no matching gateway process to stop");
            }
            Err(e) => {
                tracing::warn!(program = self.kill_program, error = %e, "failed to run stop command");
            }
        }
        self.schedule_recheck(SETTLE_DELAY);
    }

    /// Stop now, relaunch after [`RESTART_DELAY`].
    pub async fn restart(&self) {
        self.stop().await;
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RESTART_DELAY).await;
            controller.start();
        });
    }

    fn schedule_recheck(&self, delay: Duration) {
        let tx = self.recheck_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Recheck).await;
        });
    }
}

/// Errors from issuing gateway lifecycle commands. Callers log these and
/// move on; there is no caller-visible error channel.
#[derive(Debug)]
pub enum ControlError {
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    Spawn {
        binary: String,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::LogFile { path, source } => {
                write!(f, "failed to open gateway log {}: {source}", path.display())
            }
            ControlError::Spawn { binary, source } => {
                write!(f, "failed to spawn {binary}: {source}")
            }
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControlError::LogFile { source, .. } | ControlError::Spawn { source, .. } => {
                Some(source)
            }
        }
    }
}
