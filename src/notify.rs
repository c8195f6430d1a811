//! Operator notifications. Thin boundary over the desktop notification
//! facility; delivery is fire-and-forget and failures are only logged.

use crate::reconcile::GatewayState;

/// Consumer of reconciler decisions. Kept narrow so tests can record
/// notifications instead of delivering them.
pub trait Notifier {
    /// The gateway transitioned to `state`.
    fn status_changed(&self, state: GatewayState);
    /// Something the operator should know about, free text.
    fn error(&self, message: &str);
}

/// Delivers through the OS notification daemon.
#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn status_changed(&self, state: GatewayState) {
        let body = match state {
            GatewayState::Running => "Gateway is now running 🦞",
            GatewayState::Stopped => "Gateway has stopped 💀",
        };
        deliver("OpenClaw", body);
    }

    fn error(&self, message: &str) {
        deliver("OpenClaw Monitor", message);
    }
}

fn deliver(summary: &str, body: &str) {
    if let Err(e) = notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .show()
    {
        tracing::warn!(summary, error = %e, "failed to deliver desktop notification");
    }
}
