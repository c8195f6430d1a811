//! Navigation helpers: the gateway's web console and its log file.

use crate::notify::Notifier;
use crate::settings::Settings;
use crate::token;

/// Authenticated console URL. The token goes in the URL fragment, never
/// the query string: fragments are not sent in HTTP requests and never
/// reach the gateway's access logs.
pub fn dashboard_url(base: &str, token: &str) -> String {
    format!("{base}/#token={token}")
}

/// Open the authenticated console in the default browser.
///
/// The token is read fresh from the config file on every call. Any token
/// failure surfaces as one generic error notification; the distinction
/// between the failure modes lives only in the logs.
pub fn open_dashboard<N: Notifier>(settings: &Settings, notifier: &N) {
    let Some(token) = token::gateway_token() else {
        notifier.error("Could not read gateway token");
        return;
    };
    let url = dashboard_url(&settings.console_base(), &token);
    if let Err(e) = opener::open(&url) {
        tracing::warn!(error = %e, "failed to open dashboard");
    }
}

/// Open the console without authentication.
pub fn open_gateway(settings: &Settings) {
    let url = settings.console_base();
    if let Err(e) = opener::open(&url) {
        tracing::warn!(url = %url, error = %e, "failed to open gateway console");
    }
}

/// Open the gateway log file in the system's default viewer.
pub fn view_logs(settings: &Settings) {
    let path = &settings.gateway.log_file;
    if let Err(e) = opener::open(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to open gateway log");
    }
}
