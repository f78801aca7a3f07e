//! Error types for SSH sessions, discovery runs and access checks.
//!
//! Every failure is produced as a typed variant at the point where it happens,
//! so callers can branch on [`FailureKind`] instead of inspecting messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionState;

/// Why a connection attempt failed once the transport was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionCause {
    /// The remote port actively refused the TCP connection.
    Refused,
    /// The server rejected the offered private key.
    Authentication,
    /// Any other transport failure (DNS, reset, protocol error...).
    Other,
}

/// Errors that can occur while establishing or using an SSH session.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Credential material is missing or unusable.
    ///
    /// Not retryable: the user has to fix the configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The private key file does not exist at the resolved path.
    #[error("SSH key not found: {}", .0.display())]
    KeyNotFound(PathBuf),

    /// The host key is unknown or does not match the known-hosts record.
    ///
    /// The session never falls back to trusting the host.
    #[error(
        "SSH host key verification failed for {host}:{port}. If this is your first connection, run:\n  ssh-keyscan -p {port} {host} >> ~/.ssh/known_hosts"
    )]
    HostVerification { host: String, port: u16 },

    /// The connection was not established within the configured timeout.
    #[error("connection to {host} timed out after {}s", .timeout.as_secs())]
    ConnectTimeout { host: String, timeout: Duration },

    /// Transport failure while connecting.
    #[error("failed to connect to router at {host}: {message}")]
    Connection {
        host: String,
        cause: ConnectionCause,
        message: String,
    },

    /// The remote command could not be run on an established session.
    #[error("failed to execute '{command}' on {host}: {message}")]
    Exec {
        host: String,
        command: String,
        message: String,
    },

    /// The session is in a state that does not accept the operation.
    #[error("session is {0:?}, operation not allowed")]
    InvalidState(SessionState),

    /// A replayed session has no recorded output for the requested command.
    #[error("replay mismatch: {0}")]
    ReplayMismatch(String),

    /// Recording could not be encoded, decoded or stored.
    #[error("session recording error: {0}")]
    Recording(String),
}

/// Errors that abort a discovery run.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The router clock could not be read; lease activity cannot be judged.
    ///
    /// `source` is set when the command never ran, and is `None` for a
    /// non-zero exit or unparsable output.
    #[error("failed to read router clock: {message}")]
    ClockRead {
        message: String,
        #[source]
        source: Option<ConnectError>,
    },

    /// The neighbor table could not be read; there is no device set.
    #[error("failed to fetch neighbor table: {message}")]
    NeighborTable {
        message: String,
        #[source]
        source: Option<ConnectError>,
    },
}

/// Errors returned by the access check.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Connected, but the verification command did not succeed.
    #[error("connection succeeded but '{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

/// Closed classification of every failure the crate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    KeyNotFound,
    HostVerification,
    Timeout,
    ConnectionRefused,
    Authentication,
    Connection,
    CommandFailed,
    ClockRead,
    NeighborTable,
}

impl FailureKind {
    /// Checklist lines a front end can print below the error message.
    pub fn guidance(&self) -> &'static [&'static str] {
        match self {
            FailureKind::ConnectionRefused => &[
                "Router IP address is correct",
                "Router is powered on",
                "SSH service is enabled on router",
            ],
            FailureKind::Authentication | FailureKind::KeyNotFound => &[
                "SSH key path is correct (OPENWRT_SSH_KEY_PATH)",
                "SSH key exists at that path",
                "Router has your public key in its authorized keys",
            ],
            FailureKind::Timeout => &[
                "Router is on the same network",
                "Firewall is not blocking SSH",
                "Router IP address is correct",
            ],
            FailureKind::HostVerification => &[
                "Record the router's host key with ssh-keyscan",
                "Check for a changed or spoofed router if the key was already recorded",
            ],
            FailureKind::Configuration => &["Set OPENWRT_SSH_KEY_PATH, e.g. ~/.ssh/id_ed25519"],
            FailureKind::Connection
            | FailureKind::CommandFailed
            | FailureKind::ClockRead
            | FailureKind::NeighborTable => &[],
        }
    }
}

impl ConnectError {
    /// Classifies the error for front-end branching.
    pub fn kind(&self) -> FailureKind {
        match self {
            ConnectError::Configuration(_) => FailureKind::Configuration,
            ConnectError::KeyNotFound(_) => FailureKind::KeyNotFound,
            ConnectError::HostVerification { .. } => FailureKind::HostVerification,
            ConnectError::ConnectTimeout { .. } => FailureKind::Timeout,
            ConnectError::Connection { cause, .. } => match cause {
                ConnectionCause::Refused => FailureKind::ConnectionRefused,
                ConnectionCause::Authentication => FailureKind::Authentication,
                ConnectionCause::Other => FailureKind::Connection,
            },
            ConnectError::Exec { .. } => FailureKind::CommandFailed,
            ConnectError::InvalidState(_)
            | ConnectError::ReplayMismatch(_)
            | ConnectError::Recording(_) => FailureKind::Connection,
        }
    }
}

impl DiscoveryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DiscoveryError::Connect(err) => err.kind(),
            DiscoveryError::ClockRead { .. } => FailureKind::ClockRead,
            DiscoveryError::NeighborTable { .. } => FailureKind::NeighborTable,
        }
    }

    /// The session failure behind this error, if there was one.
    pub fn connect_cause(&self) -> Option<&ConnectError> {
        match self {
            DiscoveryError::Connect(err) => Some(err),
            DiscoveryError::ClockRead { source, .. }
            | DiscoveryError::NeighborTable { source, .. } => source.as_ref(),
        }
    }
}

impl ProbeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Connect(err) => err.kind(),
            ProbeError::CommandFailed { .. } => FailureKind::CommandFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_causes_map_to_distinct_kinds() {
        let refused = ConnectError::Connection {
            host: "192.168.1.1".to_string(),
            cause: ConnectionCause::Refused,
            message: "connection refused".to_string(),
        };
        let auth = ConnectError::Connection {
            host: "192.168.1.1".to_string(),
            cause: ConnectionCause::Authentication,
            message: "key rejected".to_string(),
        };
        let timeout = ConnectError::ConnectTimeout {
            host: "192.168.1.1".to_string(),
            timeout: Duration::from_secs(30),
        };

        assert_eq!(refused.kind(), FailureKind::ConnectionRefused);
        assert_eq!(auth.kind(), FailureKind::Authentication);
        assert_eq!(timeout.kind(), FailureKind::Timeout);
    }

    #[test]
    fn host_verification_message_carries_keyscan_hint() {
        let err = ConnectError::HostVerification {
            host: "10.0.0.1".to_string(),
            port: 2222,
        };
        let msg = err.to_string();
        assert!(msg.contains("ssh-keyscan -p 2222 10.0.0.1 >> ~/.ssh/known_hosts"));
        assert_eq!(err.kind(), FailureKind::HostVerification);
    }

    #[test]
    fn discovery_error_delegates_kind_to_connect_error() {
        let err = DiscoveryError::from(ConnectError::KeyNotFound(PathBuf::from("/nope")));
        assert_eq!(err.kind(), FailureKind::KeyNotFound);
        let exit = DiscoveryError::NeighborTable {
            message: "exit 1".to_string(),
            source: None,
        };
        assert_eq!(exit.kind(), FailureKind::NeighborTable);
        assert!(exit.connect_cause().is_none());
    }

    #[test]
    fn failed_table_read_keeps_its_session_cause() {
        let err = DiscoveryError::NeighborTable {
            message: "'cat /proc/net/arp' could not be run".to_string(),
            source: Some(ConnectError::Exec {
                host: "192.168.1.1".to_string(),
                command: "cat /proc/net/arp".to_string(),
                message: "channel closed".to_string(),
            }),
        };

        assert_eq!(err.kind(), FailureKind::NeighborTable);
        assert!(matches!(
            err.connect_cause(),
            Some(ConnectError::Exec { command, .. }) if command == "cat /proc/net/arp"
        ));
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("channel closed"));
    }

    #[test]
    fn timeout_guidance_mentions_firewall() {
        assert!(
            FailureKind::Timeout
                .guidance()
                .iter()
                .any(|line| line.contains("Firewall"))
        );
        assert!(FailureKind::NeighborTable.guidance().is_empty());
    }
}
