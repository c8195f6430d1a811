//! Periodic reconciliation: compare each fresh probe result against the
//! last-known gateway state and decide whether the operator should hear
//! about it.
//!
//! The reconciler state has a single writer — the task running
//! [`Monitor::run`] — and probes only produce immutable observations, so
//! no locking is needed around `last_status` / `is_first_check`.

use crate::control::Recheck;
use crate::notify::Notifier;
use crate::probe::Probe;
use crate::status::{SnapshotFile, StatusSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Gateway liveness as observed by a single probe. Derived fresh on every
/// poll, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayState {
    Running,
    Stopped,
}

impl GatewayState {
    pub fn from_running(running: bool) -> Self {
        if running {
            GatewayState::Running
        } else {
            GatewayState::Stopped
        }
    }
}

impl std::fmt::Display for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayState::Running => write!(f, "running"),
            GatewayState::Stopped => write!(f, "stopped"),
        }
    }
}

/// The state-transition core: last-known status plus the first-check flag.
#[derive(Debug)]
pub struct Reconciler {
    last_status: GatewayState,
    is_first_check: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            last_status: GatewayState::Stopped,
            is_first_check: true,
        }
    }

    /// Fold a fresh observation into the state machine.
    ///
    /// Returns `Some(new_state)` when the transition is notification-worthy:
    /// the observation differs from the last-known state AND this is not the
    /// very first check (there is no valid prior state to compare against,
    /// so announcing the ambient state would be spurious). `last_status` is
    /// always updated, changed or not.
    pub fn observe(&mut self, observed: GatewayState) -> Option<GatewayState> {
        let notify = !self.is_first_check && observed != self.last_status;
        self.is_first_check = false;
        self.last_status = observed;
        if notify {
            Some(observed)
        } else {
            None
        }
    }

    /// Last-known status (test observability; the loop reads it through
    /// `observe`).
    #[allow(dead_code)]
    pub fn last_status(&self) -> GatewayState {
        self.last_status
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the reconciler plus its collaborators and snapshot bookkeeping.
pub struct Monitor<P, N> {
    probe: P,
    notifier: N,
    snapshot: SnapshotFile,
    reconciler: Reconciler,
    checks: u64,
    last_change: Option<DateTime<Utc>>,
}

impl<P: Probe, N: Notifier> Monitor<P, N> {
    pub fn new(probe: P, notifier: N, snapshot: SnapshotFile) -> Self {
        Self {
            probe,
            notifier,
            snapshot,
            reconciler: Reconciler::new(),
            checks: 0,
            last_change: None,
        }
    }

    /// One poll: probe, write the status snapshot unconditionally, notify
    /// only on a reported transition.
    pub async fn check(&mut self) -> GatewayState {
        let observed = GatewayState::from_running(self.probe.is_running().await);
        self.checks += 1;
        tracing::debug!(state = %observed, checks = self.checks, "gateway probed");

        if let Some(new_state) = self.reconciler.observe(observed) {
            self.last_change = Some(Utc::now());
            tracing::info!(state = %new_state, "gateway state changed");
            self.notifier.status_changed(new_state);
        }

        // The snapshot (the operator-visible display) refreshes on every
        // check; only the notification is gated on a transition.
        let snap = StatusSnapshot {
            pid: std::process::id(),
            state: observed,
            checks: self.checks,
            last_change: self.last_change,
            last_update: Utc::now(),
        };
        if let Err(e) = self.snapshot.write(&snap) {
            tracing::warn!(error = %e, "failed to write status snapshot");
        }

        observed
    }

    /// The poll loop: one check immediately, then one per `poll_interval`,
    /// plus expedited checks whenever a [`Recheck`] arrives from a
    /// controller action. Runs until the surrounding task is dropped.
    pub async fn run(&mut self, poll_interval: Duration, mut recheck_rx: mpsc::Receiver<Recheck>) {
        let mut ticker = tokio::time::interval(poll_interval);
        let mut recheck_open = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                msg = recheck_rx.recv(), if recheck_open => {
                    if msg.is_none() {
                        // No controllers left; keep polling on the timer.
                        recheck_open = false;
                        continue;
                    }
                    tracing::debug!("expedited status check");
                }
            }
            self.check().await;
        }
    }

    /// Remove the on-disk snapshot (clean shutdown).
    pub fn cleanup(&self) {
        self.snapshot.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[test]
    fn test_first_check_never_notifies() {
        for observed in [GatewayState::Running, GatewayState::Stopped] {
            let mut r = Reconciler::new();
            assert_eq!(r.observe(observed), None, "first check of {observed}");
            assert_eq!(r.last_status(), observed);
        }
    }

    #[test]
    fn test_stopped_to_running_notifies_once() {
        let mut r = Reconciler::new();
        r.observe(GatewayState::Stopped);
        assert_eq!(r.observe(GatewayState::Running), Some(GatewayState::Running));
        assert_eq!(r.last_status(), GatewayState::Running);
    }

    #[test]
    fn test_running_to_stopped_notifies_once() {
        let mut r = Reconciler::new();
        r.observe(GatewayState::Running);
        assert_eq!(r.observe(GatewayState::Stopped), Some(GatewayState::Stopped));
        assert_eq!(r.last_status(), GatewayState::Stopped);
    }

    #[test]
    fn test_repeated_observation_is_silent() {
        let mut r = Reconciler::new();
        r.observe(GatewayState::Running);
        for _ in 0..5 {
            assert_eq!(r.observe(GatewayState::Running), None);
        }
        assert_eq!(r.last_status(), GatewayState::Running);
    }

    #[test]
    fn test_flap_notifies_on_each_change() {
        let mut r = Reconciler::new();
        r.observe(GatewayState::Stopped);
        assert!(r.observe(GatewayState::Running).is_some());
        assert!(r.observe(GatewayState::Stopped).is_some());
        assert!(r.observe(GatewayState::Running).is_some());
    }

    /// Probe that replays a fixed script, then reports not-running.
    struct ScriptedProbe(Mutex<VecDeque<bool>>);

    impl ScriptedProbe {
        fn new(script: &[bool]) -> Self {
            Self(Mutex::new(script.iter().copied().collect()))
        }
    }

    impl Probe for ScriptedProbe {
        fn is_running(&self) -> impl Future<Output = bool> + Send {
            let next = self.0.lock().unwrap().pop_front().unwrap_or(false);
            async move { next }
        }
    }

    /// Notifier that records what it was asked to deliver.
    #[derive(Default)]
    struct RecordingNotifier {
        changes: Mutex<Vec<GatewayState>>,
        errors: Mutex<Vec<String>>,
    }

    impl Notifier for &RecordingNotifier {
        fn status_changed(&self, state: GatewayState) {
            self.changes.lock().unwrap().push(state);
        }

        fn error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn test_check_sequence_notifies_only_on_transitions() {
        let dir = tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let mut monitor = Monitor::new(
            ScriptedProbe::new(&[false, true, true, false]),
            &notifier,
            SnapshotFile::new(dir.path().join("monitor.status")),
        );

        assert_eq!(monitor.check().await, GatewayState::Stopped);
        assert_eq!(monitor.check().await, GatewayState::Running);
        assert_eq!(monitor.check().await, GatewayState::Running);
        assert_eq!(monitor.check().await, GatewayState::Stopped);

        let changes = notifier.changes.lock().unwrap();
        assert_eq!(*changes, vec![GatewayState::Running, GatewayState::Stopped]);
    }

    #[tokio::test]
    async fn test_first_check_running_is_suppressed_but_recorded() {
        let dir = tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let snapshot_path = dir.path().join("monitor.status");
        let mut monitor = Monitor::new(
            ScriptedProbe::new(&[true]),
            &notifier,
            SnapshotFile::new(snapshot_path.clone()),
        );

        monitor.check().await;

        assert!(notifier.changes.lock().unwrap().is_empty());
        let snap = SnapshotFile::new(snapshot_path).read().unwrap().unwrap();
        assert_eq!(snap.state, GatewayState::Running);
        assert_eq!(snap.checks, 1);
        assert_eq!(snap.last_change, None);
    }

    #[tokio::test]
    async fn test_snapshot_refreshes_even_without_transition() {
        let dir = tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let snapshot_path = dir.path().join("monitor.status");
        let mut monitor = Monitor::new(
            ScriptedProbe::new(&[true, true, true]),
            &notifier,
            SnapshotFile::new(snapshot_path.clone()),
        );

        for _ in 0..3 {
            monitor.check().await;
        }

        let snap = SnapshotFile::new(snapshot_path).read().unwrap().unwrap();
        assert_eq!(snap.checks, 3);
        assert!(notifier.changes.lock().unwrap().is_empty());
    }
}
