//! Launch-at-login toggle, backed by the per-user autostart facility
//! (an XDG autostart entry that runs `openclaw-monitor watch`).
//! Registration failures are logged, never surfaced.

use std::path::{Path, PathBuf};

const ENTRY_NAME: &str = "openclaw-monitor.desktop";

fn entry_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("autostart").join(ENTRY_NAME))
}

/// Whether launch at login is currently registered.
pub fn is_enabled() -> bool {
    entry_path().map(|p| p.is_file()).unwrap_or(false)
}

/// Register or unregister the monitor to start at login.
pub fn set_enabled(enabled: bool) {
    let Some(path) = entry_path() else {
        tracing::warn!("could not determine autostart directory");
        return;
    };
    let result = if enabled {
        match std::env::current_exe() {
            Ok(exe) => write_entry(&path, &exe),
            Err(e) => {
                tracing::warn!(error = %e, "could not determine monitor executable path");
                return;
            }
        }
    } else {
        remove_entry(&path)
    };
    match result {
        Ok(()) => tracing::info!(enabled, "launch at login updated"),
        Err(e) => tracing::warn!(enabled, error = %e, "failed to update launch at login"),
    }
}

fn write_entry(path: &Path, exe: &Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=OpenClaw Monitor\n\
         Exec={} watch\n\
         X-GNOME-Autostart-enabled=true\n",
        exe.display()
    );
    std::fs::write(path, content)
}

fn remove_entry(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
