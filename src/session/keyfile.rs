use super::*;

/// Expands a leading `~` or `~/` to the current user's home directory.
pub fn expand_home(locator: &str) -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        if locator == "~" {
            return home;
        }
        if let Some(rest) = locator.strip_prefix("~/") {
            return home.join(rest);
        }
    }
    PathBuf::from(locator)
}

/// Resolves the private-key locator to an existing file.
pub fn resolve_key_path(locator: &str) -> Result<PathBuf, ConnectError> {
    if locator.trim().is_empty() {
        return Err(ConnectError::Configuration(
            "SSH key path not configured. Set OPENWRT_SSH_KEY_PATH".to_string(),
        ));
    }

    let path = expand_home(locator);
    if !path.exists() {
        return Err(ConnectError::KeyNotFound(path));
    }
    Ok(path)
}

/// Only owner read-write (`600`) and owner read-only (`400`) are accepted silently.
pub fn has_loose_permissions(mode: u32) -> bool {
    !matches!(mode & 0o777, 0o600 | 0o400)
}

#[cfg(unix)]
pub(super) fn warn_on_loose_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) => {
            let mode = meta.permissions().mode() & 0o777;
            if has_loose_permissions(mode) {
                warn!(
                    "SSH key {} has loose permissions ({:o}). Recommended: 600",
                    path.display(),
                    mode
                );
            }
        }
        Err(e) => debug!("Could not stat SSH key {}: {}", path.display(), e),
    }
}

#[cfg(not(unix))]
pub(super) fn warn_on_loose_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_prefix_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~/.ssh/id_ed25519"), home.join(".ssh/id_ed25519"));
        assert_eq!(expand_home("~"), home);
    }

    #[test]
    fn other_paths_are_left_alone() {
        assert_eq!(expand_home("/etc/key"), PathBuf::from("/etc/key"));
        assert_eq!(expand_home("keys/~/odd"), PathBuf::from("keys/~/odd"));
        assert_eq!(expand_home("~user/key"), PathBuf::from("~user/key"));
    }

    #[test]
    fn empty_locator_is_configuration_error() {
        assert!(matches!(
            resolve_key_path("  "),
            Err(ConnectError::Configuration(_))
        ));
    }

    #[test]
    fn missing_key_reports_resolved_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("id_missing");
        let locator = missing.to_string_lossy().into_owned();

        match resolve_key_path(&locator) {
            Err(ConnectError::KeyNotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn existing_key_resolves() {
        let key = tempfile::NamedTempFile::new().expect("temp key");
        let locator = key.path().to_string_lossy().into_owned();
        assert_eq!(resolve_key_path(&locator).expect("resolves"), key.path());
    }

    #[test]
    fn only_owner_only_modes_are_tight() {
        assert!(!has_loose_permissions(0o600));
        assert!(!has_loose_permissions(0o400));
        assert!(!has_loose_permissions(0o100600));
        assert!(has_loose_permissions(0o644));
        assert!(has_loose_permissions(0o640));
        assert!(has_loose_permissions(0o700));
        assert!(has_loose_permissions(0o777));
    }
}
