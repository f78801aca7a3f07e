use super::*;

use async_ssh2_tokio::Config;
use async_ssh2_tokio::client::{AuthMethod, Client};
use std::io;

use crate::error::ConnectionCause;

/// Fully resolved connection parameters handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Existing private key file, `~` already expanded.
    pub key_path: PathBuf,
    pub security: ConnectionSecurityOptions,
    /// Budget the session gives the handshake; reported in timeout errors.
    pub connect_timeout: Duration,
}

/// The network side of a [`Session`].
///
/// Implementations perform exactly one handshake per `connect` call and exactly
/// one remote execution per `execute` call; retries are the caller's business.
#[async_trait]
pub trait Transport: Send {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), ConnectError>;

    async fn execute(&mut self, command: &str) -> Result<CommandResult, ConnectError>;

    async fn disconnect(&mut self) -> Result<(), ConnectError>;
}

/// Production transport backed by `async-ssh2-tokio`.
#[derive(Default)]
pub struct SshTransport {
    client: Option<Client>,
    host: String,
}

impl SshTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn exec_error(&self, command: &str, message: impl ToString) -> ConnectError {
        ConnectError::Exec {
            host: self.host.clone(),
            command: command.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), ConnectError> {
        let config = Config {
            preferred: target.security.preferred(),
            ..Default::default()
        };

        let client = Client::connect_with_config(
            (target.host.clone(), target.port),
            &target.username,
            AuthMethod::with_key_file(&target.key_path, None),
            target.security.server_check(),
            config,
        )
        .await
        .map_err(|err| classify_connect_error(err, target))?;

        debug!(
            "{}@{}:{} SSH handshake and key authentication successful",
            target.username, target.host, target.port
        );
        self.host = target.host.clone();
        self.client = Some(client);
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<CommandResult, ConnectError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| self.exec_error(command, "transport is not connected"))?;

        let result = client
            .execute(command)
            .await
            .map_err(|err| self.exec_error(command, err))?;

        Ok(CommandResult {
            stdout: result.stdout,
            stderr: result.stderr,
            exit_status: i32::try_from(result.exit_status).unwrap_or(i32::MAX),
        })
    }

    async fn disconnect(&mut self) -> Result<(), ConnectError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        client
            .disconnect()
            .await
            .map_err(|err| ConnectError::Connection {
                host: self.host.clone(),
                cause: ConnectionCause::Other,
                message: err.to_string(),
            })
    }
}

/// Maps a library failure onto the closed error taxonomy at the point of failure.
fn classify_connect_error(err: async_ssh2_tokio::Error, target: &ConnectTarget) -> ConnectError {
    use async_ssh2_tokio::Error;

    let connection = |cause: ConnectionCause, message: String| ConnectError::Connection {
        host: target.host.clone(),
        cause,
        message,
    };

    match err {
        Error::ServerCheckFailed | Error::SshError(russh::Error::UnknownKey) => {
            ConnectError::HostVerification {
                host: target.host.clone(),
                port: target.port,
            }
        }
        Error::SshError(russh::Error::ConnectionTimeout) => ConnectError::ConnectTimeout {
            host: target.host.clone(),
            timeout: target.connect_timeout,
        },
        Error::KeyAuthFailed => connection(
            ConnectionCause::Authentication,
            "all configured authentication methods failed".to_string(),
        ),
        Error::KeyInvalid(e) => ConnectError::Configuration(format!(
            "unable to load SSH key {}: {e}",
            target.key_path.display()
        )),
        Error::AddressInvalid(e) => connection(io_cause(&e), e.to_string()),
        Error::SshError(russh::Error::IO(e)) => connection(io_cause(&e), e.to_string()),
        other => connection(ConnectionCause::Other, other.to_string()),
    }
}

fn io_cause(err: &io::Error) -> ConnectionCause {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => ConnectionCause::Refused,
        _ => ConnectionCause::Other,
    }
}
