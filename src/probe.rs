//! Access check: verifies that the router accepts the key and runs commands.

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{SYSTEM_INFO_COMMAND, UCI_VERSION_COMMAND};
use crate::error::ProbeError;
use crate::session::{Session, Transport};

/// What the router reported during the access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccessReport {
    pub host: String,
    pub username: String,
    /// `uname -a` output.
    pub system_info: String,
    /// Present on OpenWrt only.
    pub uci_version: Option<String>,
}

/// Connects, runs `uname -a` and, if available, `uci version`.
///
/// The session is left connected; disconnecting is up to the caller.
pub async fn check_access<T: Transport>(
    session: &mut Session<T>,
) -> Result<AccessReport, ProbeError> {
    session.connect().await?;

    let system = session.execute(SYSTEM_INFO_COMMAND).await?;
    if !system.success() {
        return Err(ProbeError::CommandFailed {
            command: SYSTEM_INFO_COMMAND.to_string(),
            stderr: system.stderr.trim().to_string(),
        });
    }

    let uci_version = match session.execute(UCI_VERSION_COMMAND).await {
        Ok(result) if result.success() => Some(result.stdout.trim().to_string()),
        Ok(result) => {
            debug!("'{}' exited with {}", UCI_VERSION_COMMAND, result.exit_status);
            None
        }
        Err(e) => {
            debug!("'{}' failed: {}", UCI_VERSION_COMMAND, e);
            None
        }
    };

    let creds = session.credentials();
    Ok(AccessReport {
        host: creds.host.clone(),
        username: creds.username.clone(),
        system_info: system.stdout.trim().to_string(),
        uci_version,
    })
}
