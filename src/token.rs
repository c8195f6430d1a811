//! Gateway auth token retrieval from `~/.openclaw/openclaw.json`.
//!
//! The token is re-read on every call — never cached — so a rotated token
//! is picked up on the next dashboard open. Every failure mode (missing
//! file, symlink escaping the home tree, parse error, out-of-range length)
//! collapses to `None`; callers decide how to surface "no token".

use serde::Deserialize;
use std::path::Path;

/// Token length bounds, inclusive. Anything outside is treated as garbage.
const TOKEN_MIN_CHARS: usize = 10;
const TOKEN_MAX_CHARS: usize = 1024;

/// The subset of `openclaw.json` we care about: `gateway.auth.token`.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    gateway: Option<GatewaySection>,
}

#[derive(Debug, Deserialize)]
struct GatewaySection {
    auth: Option<AuthSection>,
}

#[derive(Debug, Deserialize)]
struct AuthSection {
    token: Option<String>,
}

/// Read and validate the gateway auth token from the user's config file.
///
/// Returns `None` if the file is missing, unreadable, escapes the home
/// directory through symlinks, fails to parse, lacks the token field, or
/// holds a token of invalid length.
pub fn gateway_token() -> Option<String> {
    let home = match dirs::home_dir() {
        Some(h) => h,
        None => {
            tracing::warn!("could not determine home directory");
            return None;
        }
    };
    let path = home.join(".openclaw").join("openclaw.json");
    read_token(&path, &home)
}

/// Path-parameterized core of `gateway_token`, so tests can supply a
/// temporary home tree.
fn read_token(path: &Path, home: &Path) -> Option<String> {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "config file not found");
            return None;
        }
    };
    if meta.is_dir() {
        tracing::debug!(path = %path.display(), "config path is a directory");
        return None;
    }

    // Resolve symlinks and require the real path to stay inside the real
    // home directory. Defeats symlink redirection to files outside the
    // user's own tree.
    let resolved = match std::fs::canonicalize(path) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not resolve config path");
            return None;
        }
    };
    let real_home = match std::fs::canonicalize(home) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(home = %home.display(), error = %e, "could not resolve home directory");
            return None;
        }
    };
    if !resolved.starts_with(&real_home) {
        tracing::warn!(
            resolved = %resolved.display(),
            "config path resolves outside home directory, refusing to read"
        );
        return None;
    }

    // Advisory only: a token file readable by group/other is worth flagging
    // but not worth breaking the dashboard over.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                mode = format!("{:o}", mode & 0o7777),
                path = %path.display(),
                "config file has loose permissions"
            );
        }
    }

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "failed to read config file");
            return None;
        }
    };
    let config: ConfigFile = match serde_json::from_slice(&bytes) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "failed to parse config file");
            return None;
        }
    };

    let token = config.gateway?.auth?.token?;
    let len = token.chars().count();
    if !(TOKEN_MIN_CHARS..=TOKEN_MAX_CHARS).contains(&len) {
        tracing::debug!(len, "token has invalid length");
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Fake home tree with `.openclaw/openclaw.json` inside it.
    fn home_with_config(content: &str) -> (TempDir, PathBuf) {
        let home = tempfile::tempdir().unwrap();
        let dir = home.path().join(".openclaw");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("openclaw.json");
        std::fs::write(&path, content).unwrap();
        (home, path)
    }

    fn config_json(token: &str) -> String {
        format!(r#"{{"gateway": {{"auth": {{"token": "{token}"}}}}}}"#)
    }

    #[test]
    fn test_valid_token_is_returned() {
        let (home, path) = home_with_config(&config_json("abcdefghij"));
        assert_eq!(
            read_token(&path, home.path()),
            Some("abcdefghij".to_string())
        );
    }

    #[test]
    fn test_missing_file_yields_none() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join(".openclaw").join("openclaw.json");
        assert_eq!(read_token(&path, home.path()), None);
    }

    #[test]
    fn test_directory_at_config_path_yields_none() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join(".openclaw").join("openclaw.json");
        std::fs::create_dir_all(&path).unwrap();
        assert_eq!(read_token(&path, home.path()), None);
    }

    #[test]
    fn test_token_length_boundaries() {
        // 9 and 1025 rejected; 10 and 1024 accepted.
        for (len, expected_some) in [(9, false), (10, true), (1024, true), (1025, false)] {
            let token = "a".repeat(len);
            let (home, path) = home_with_config(&config_json(&token));
            let result = read_token(&path, home.path());
            assert_eq!(result.is_some(), expected_some, "len {len}");
            if expected_some {
                assert_eq!(result.unwrap().len(), len);
            }
        }
    }

    #[test]
    fn test_malformed_json_yields_none() {
        let (home, path) = home_with_config("not json at all");
        assert_eq!(read_token(&path, home.path()), None);
    }

    #[test]
    fn test_missing_token_field_yields_none() {
        let (home, path) = home_with_config(r#"{"gateway": {"auth": {}}}"#);
        assert_eq!(read_token(&path, home.path()), None);
    }

    #[test]
    fn test_missing_gateway_section_yields_none() {
        let (home, path) = home_with_config(r#"{"other": true}"#);
        assert_eq!(read_token(&path, home.path()), None);
    }

    #[test]
    fn test_wrong_token_type_yields_none() {
        let (home, path) = home_with_config(r#"{"gateway": {"auth": {"token": 12345}}}"#);
        assert_eq!(read_token(&path, home.path()), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escaping_home_is_rejected() {
        // A perfectly valid config that lives OUTSIDE the home tree,
        // reached via a symlink inside it.
        let home = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("openclaw.json");
        std::fs::write(&target, config_json("abcdefghij")).unwrap();

        let dir = home.path().join(".openclaw");
        std::fs::create_dir_all(&dir).unwrap();
        let link = dir.join("openclaw.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(read_token(&link, home.path()), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_home_is_accepted() {
        let home = tempfile::tempdir().unwrap();
        let target = home.path().join("real-config.json");
        std::fs::write(&target, config_json("abcdefghij")).unwrap();

        let dir = home.path().join(".openclaw");
        std::fs::create_dir_all(&dir).unwrap();
        let link = dir.join("openclaw.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(
            read_token(&link, home.path()),
            Some("abcdefghij".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_loose_permissions_warn_but_still_return_token() {
        use std::os::unix::fs::PermissionsExt;
        let (home, path) = home_with_config(&config_json("abcdefghij"));
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(
            read_token(&path, home.path()),
            Some("abcdefghij".to_string())
        );
    }
}
