//! Host credentials and their environment-variable source.

use std::env;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USERNAME};
use crate::error::ConnectError;

/// Everything needed to open a session to one router.
///
/// Authentication is key based only; there is deliberately no password field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Private key locator, may start with `~/`.
    pub key_path: String,
}

impl HostCredentials {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        key_path: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            key_path: key_path.into(),
        }
    }

    /// Reads credentials from the process environment.
    ///
    /// - `OPENWRT_ROUTER_IP`, then `OPENFAM_ROUTER_IP` (default `192.168.1.1`)
    /// - `OPENWRT_ROUTER_PORT` (default `22`)
    /// - `OPENWRT_USERNAME` (default `root`)
    /// - `OPENWRT_SSH_KEY_PATH` (required)
    pub fn from_env() -> Result<Self, ConnectError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`HostCredentials::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConnectError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let key_path = non_empty("OPENWRT_SSH_KEY_PATH").ok_or_else(|| {
            ConnectError::Configuration(
                "OPENWRT_SSH_KEY_PATH is required. Add it to your environment:\n  OPENWRT_SSH_KEY_PATH=~/.ssh/id_ed25519"
                    .to_string(),
            )
        })?;

        let host = non_empty("OPENWRT_ROUTER_IP")
            .or_else(|| non_empty("OPENFAM_ROUTER_IP"))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match non_empty("OPENWRT_ROUTER_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                ConnectError::Configuration(format!("invalid OPENWRT_ROUTER_PORT '{raw}': {e}"))
            })?,
            None => DEFAULT_PORT,
        };

        let username =
            non_empty("OPENWRT_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string());

        Ok(Self {
            host,
            port,
            username,
            key_path,
        })
    }

    /// `user@host:port`, used as the session identity in logs and recordings.
    pub fn device_addr(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let creds =
            HostCredentials::from_lookup(lookup(&[("OPENWRT_SSH_KEY_PATH", "~/.ssh/id_ed25519")]))
                .expect("credentials");

        assert_eq!(creds.host, "192.168.1.1");
        assert_eq!(creds.port, 22);
        assert_eq!(creds.username, "root");
        assert_eq!(creds.key_path, "~/.ssh/id_ed25519");
    }

    #[test]
    fn missing_key_path_is_configuration_error() {
        let err = HostCredentials::from_lookup(lookup(&[("OPENWRT_ROUTER_IP", "10.0.0.1")]))
            .expect_err("key path is required");
        assert!(matches!(err, ConnectError::Configuration(_)));
    }

    #[test]
    fn openfam_router_ip_is_a_fallback() {
        let creds = HostCredentials::from_lookup(lookup(&[
            ("OPENWRT_SSH_KEY_PATH", "/keys/router"),
            ("OPENFAM_ROUTER_IP", "10.1.1.1"),
        ]))
        .expect("credentials");
        assert_eq!(creds.host, "10.1.1.1");

        let creds = HostCredentials::from_lookup(lookup(&[
            ("OPENWRT_SSH_KEY_PATH", "/keys/router"),
            ("OPENFAM_ROUTER_IP", "10.1.1.1"),
            ("OPENWRT_ROUTER_IP", "10.2.2.2"),
        ]))
        .expect("credentials");
        assert_eq!(creds.host, "10.2.2.2");
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let err = HostCredentials::from_lookup(lookup(&[
            ("OPENWRT_SSH_KEY_PATH", "/keys/router"),
            ("OPENWRT_ROUTER_PORT", "ssh"),
        ]))
        .expect_err("port must be numeric");
        assert!(matches!(err, ConnectError::Configuration(msg) if msg.contains("ssh")));
    }

    #[test]
    fn device_addr_formats_user_host_port() {
        let creds = HostCredentials::new("192.168.8.1", 2222, "admin", "/k");
        assert_eq!(creds.device_addr(), "admin@192.168.8.1:2222");
    }
}
