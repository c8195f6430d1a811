//! Gateway liveness probe via process-table lookup.

use std::future::Future;
use std::process::Stdio;
use tokio::process::Command;

/// Fixed pattern identifying the gateway in the process table. Used by
/// both the probe and the controller's kill — never interpolated with
/// user input.
pub const GATEWAY_PATTERN: &str = "openclaw gateway";

/// A point-in-time liveness check. Implementations must be infallible:
/// any failure to even run the check reads as "not running".
pub trait Probe {
    fn is_running(&self) -> impl Future<Output = bool> + Send;
}

/// Probes the OS process table with `pgrep -f`.
#[derive(Debug, Clone, Copy)]
pub struct PgrepProbe;

impl Probe for PgrepProbe {
    fn is_running(&self) -> impl Future<Output = bool> + Send {
        run_probe("pgrep", GATEWAY_PATTERN)
    }
}

/// Exit status 0 means at least one process matched. Non-zero or a spawn
/// failure both read as "not running".
async fn run_probe(program: &str, pattern: &str) -> bool {
    match Command::new(program)
        .arg("-f")
        .arg(pattern)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(e) => {
            tracing::warn!(
                program,
                error = %e,
                "failed to run process probe, assuming gateway is not running"
            );
            false
        }
    }
}
