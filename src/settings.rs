use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level settings loaded from `~/.openclaw/monitor.toml`.
///
/// The file is optional: a missing file yields defaults, a malformed one
/// is reported and also yields defaults. The gateway process pattern is
/// deliberately NOT configurable — probing and killing always use the
/// fixed pattern in `probe::GATEWAY_PATTERN`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub poll: PollSettings,
    pub gateway: GatewaySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Command used to launch the gateway (resolved through PATH).
    pub binary: String,
    /// Where the detached gateway's stdout/stderr are appended.
    pub log_file: PathBuf,
    /// Port of the gateway's local web console.
    pub console_port: u16,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            binary: "openclaw".to_string(),
            log_file: PathBuf::from("/tmp/openclaw-gateway.log"),
            console_port: 18789,
        }
    }
}

impl Settings {
    /// Default settings file location: `~/.openclaw/monitor.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".openclaw").join("monitor.toml"))
    }

    /// Load settings from `path`, falling back to defaults when the file
    /// is absent. A parse error is logged and defaults are used — bad
    /// settings must never take the monitor down.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Self::default();
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read settings, using defaults");
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                Self::default()
            }
        }
    }

    /// Base URL of the gateway's web console.
    pub fn console_base(&self) -> String {
        format!("http://127.0.0.1:{}", self.gateway.console_port)
    }
}
