use super::*;

/// Security level used for SSH algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum SecurityLevel {
    /// Strict modern algorithms (default).
    #[default]
    Secure,
    /// Adds SHA-1 based algorithms for older router firmware.
    Balanced,
}

/// Where the trusted host keys are read from.
///
/// There is intentionally no variant that skips host verification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KnownHosts {
    /// `~/.ssh/known_hosts`
    #[default]
    Default,
    File(PathBuf),
}

/// Connection security options for SSH establishment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionSecurityOptions {
    /// SSH algorithm policy.
    pub level: SecurityLevel,
    /// Known-hosts source used to verify the router's host key.
    pub known_hosts: KnownHosts,
}

impl ConnectionSecurityOptions {
    /// Secure-by-default profile (recommended).
    pub fn secure_default() -> Self {
        Self {
            level: SecurityLevel::Secure,
            known_hosts: KnownHosts::Default,
        }
    }

    /// Balanced profile for routers running older dropbear builds.
    pub fn balanced() -> Self {
        Self {
            level: SecurityLevel::Balanced,
            known_hosts: KnownHosts::Default,
        }
    }

    /// Verifies host keys against `path` instead of the user's known-hosts file.
    pub fn with_known_hosts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = KnownHosts::File(path.into());
        self
    }

    pub(super) fn preferred(&self) -> Preferred {
        match self.level {
            SecurityLevel::Secure => Preferred {
                kex: Cow::Borrowed(config::SECURE_KEX_ORDER),
                key: Cow::Borrowed(config::SECURE_KEY_TYPES),
                cipher: Cow::Borrowed(config::SECURE_CIPHERS),
                mac: Cow::Borrowed(config::SECURE_MAC_ALGORITHMS),
                compression: Cow::Borrowed(config::DEFAULT_COMPRESSION_ALGORITHMS),
            },
            SecurityLevel::Balanced => Preferred {
                kex: Cow::Borrowed(config::BALANCED_KEX_ORDER),
                key: Cow::Borrowed(config::BALANCED_KEY_TYPES),
                cipher: Cow::Borrowed(config::BALANCED_CIPHERS),
                mac: Cow::Borrowed(config::BALANCED_MAC_ALGORITHMS),
                compression: Cow::Borrowed(config::DEFAULT_COMPRESSION_ALGORITHMS),
            },
        }
    }

    pub(super) fn server_check(&self) -> ServerCheckMethod {
        match &self.known_hosts {
            KnownHosts::Default => ServerCheckMethod::DefaultKnownHostsFile,
            KnownHosts::File(path) => {
                ServerCheckMethod::KnownHostsFile(path.to_string_lossy().into_owned())
            }
        }
    }
}
