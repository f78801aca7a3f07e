use super::*;

/// Holds a session in `Connecting` and puts it back to `Disconnected` unless
/// the attempt is settled. Dropping the `connect` future mid-handshake
/// therefore never leaves the session stuck in `Connecting`.
struct ConnectAttempt<'a> {
    state: &'a mut SessionState,
    settled: bool,
}

impl<'a> ConnectAttempt<'a> {
    fn begin(state: &'a mut SessionState) -> Self {
        *state = SessionState::Connecting;
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, next: SessionState) {
        *self.state = next;
        self.settled = true;
    }
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.state = SessionState::Disconnected;
        }
    }
}

impl Session<SshTransport> {
    /// Creates a disconnected session using the secure default profile.
    pub fn new(credentials: HostCredentials) -> Self {
        Self::with_transport(credentials, SshTransport::new())
    }

    /// Creates a disconnected session with explicit security options.
    pub fn with_security(
        credentials: HostCredentials,
        security: ConnectionSecurityOptions,
    ) -> Self {
        Self::with_transport(credentials, SshTransport::new()).security(security)
    }
}

impl<T: Transport> Session<T> {
    /// Creates a disconnected session on top of any transport.
    pub fn with_transport(credentials: HostCredentials, transport: T) -> Self {
        Self {
            credentials,
            security: ConnectionSecurityOptions::default(),
            connect_timeout: config::CONNECT_TIMEOUT,
            transport,
            state: SessionState::Disconnected,
            recorder: None,
        }
    }

    pub fn security(mut self, security: ConnectionSecurityOptions) -> Self {
        self.security = security;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Records connection events and every executed command into `recorder`.
    pub fn with_recorder(mut self, recorder: SessionRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn credentials(&self) -> &HostCredentials {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn recorder(&self) -> Option<&SessionRecorder> {
        self.recorder.as_ref()
    }

    fn record(&self, event: SessionEvent) {
        if let Some(recorder) = self.recorder.as_ref()
            && let Err(e) = recorder.record_event(event)
        {
            debug!("{} Failed to record session event: {}", self.credentials.device_addr(), e);
        }
    }

    /// Establishes the connection. A no-op when already connected.
    ///
    /// The key file is checked before any network traffic: an empty locator
    /// is a configuration error, a missing file is [`ConnectError::KeyNotFound`],
    /// and loose permissions only produce a warning.
    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        match self.state {
            SessionState::Connected => return Ok(()),
            SessionState::Connecting => return Err(ConnectError::InvalidState(self.state)),
            SessionState::Disconnected => {}
        }

        let key_path = resolve_key_path(&self.credentials.key_path)?;
        keyfile::warn_on_loose_permissions(&key_path);

        let target = ConnectTarget {
            host: self.credentials.host.clone(),
            port: self.credentials.port,
            username: self.credentials.username.clone(),
            key_path,
            security: self.security.clone(),
            connect_timeout: self.connect_timeout,
        };
        let device_addr = self.credentials.device_addr();
        debug!("{} Connecting", device_addr);

        let attempt = ConnectAttempt::begin(&mut self.state);
        let outcome =
            tokio::time::timeout(self.connect_timeout, self.transport.connect(&target)).await;

        match outcome {
            Ok(Ok(())) => {
                attempt.settle(SessionState::Connected);
                debug!("{} Connected", device_addr);
                self.record(SessionEvent::ConnectionEstablished { device_addr });
                Ok(())
            }
            Ok(Err(err)) => {
                attempt.settle(SessionState::Disconnected);
                debug!("{} Connection failed: {}", device_addr, err);
                Err(err)
            }
            Err(_) => {
                attempt.settle(SessionState::Disconnected);
                debug!(
                    "{} Connection timed out after {:?}",
                    device_addr, self.connect_timeout
                );
                Err(ConnectError::ConnectTimeout {
                    host: self.credentials.host.clone(),
                    timeout: self.connect_timeout,
                })
            }
        }
    }

    /// Runs `command` once, connecting first if needed.
    ///
    /// Any exit status is returned as a [`CommandResult`]; only failures to
    /// run the command at all become errors. Such a failure also drops the
    /// connection, so the next call reconnects. There is no per-command timeout.
    pub async fn execute(&mut self, command: &str) -> Result<CommandResult, ConnectError> {
        match self.state {
            SessionState::Connected => {}
            SessionState::Disconnected => self.connect().await?,
            SessionState::Connecting => return Err(ConnectError::InvalidState(self.state)),
        }

        let device_addr = self.credentials.device_addr();
        debug!("{} Executing: {}", device_addr, command);

        let result = match self.transport.execute(command).await {
            Ok(result) => result,
            Err(err) => {
                debug!("{} '{}' could not be run: {}", device_addr, command, err);
                self.teardown("execute_failed").await;
                return Err(err);
            }
        };
        trace!(
            "{} '{}' exited with {}: stdout={:?} stderr={:?}",
            device_addr, command, result.exit_status, result.stdout, result.stderr
        );

        self.record(SessionEvent::CommandExecuted {
            command: command.to_string(),
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
            exit_status: result.exit_status,
        });
        Ok(result)
    }

    /// Releases the transport. Safe to call on a disconnected session.
    pub async fn disconnect(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }

        self.teardown("client_disconnect_called").await;
    }

    async fn teardown(&mut self, reason: &str) {
        let device_addr = self.credentials.device_addr();
        if let Err(e) = self.transport.disconnect().await {
            // The connection is dropped either way.
            debug!("Error closing connection {}: {}", device_addr, e);
        }
        self.state = SessionState::Disconnected;
        self.record(SessionEvent::ConnectionClosed {
            reason: reason.to_string(),
        });
        debug!("{} SSH connection closed", device_addr);
    }
}
