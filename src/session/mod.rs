//! SSH session lifecycle and command execution.
//!
//! A [`Session`] owns exactly one connection to one router and runs commands
//! against it strictly one after another. The network side sits behind the
//! [`Transport`] trait: [`SshTransport`] talks to a real router, while
//! [`ReplayTransport`] answers from a recorded session.
//!
//! # Main Components
//!
//! - [`Session`] - connect / execute / disconnect state machine
//! - [`Transport`] - the seam between the state machine and the wire
//! - [`ConnectionSecurityOptions`] - algorithm policy and known-hosts source
//! - [`SessionRecorder`] - JSONL capture of executed commands

use async_ssh2_tokio::ServerCheckMethod;
use async_trait::async_trait;
use log::{debug, trace, warn};
use russh::Preferred;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config;
use crate::credentials::HostCredentials;
use crate::error::ConnectError;

pub use keyfile::{expand_home, has_loose_permissions, resolve_key_path};
pub use recording::{ReplayTransport, SessionEvent, SessionRecordEntry, SessionRecorder};
pub use security::{ConnectionSecurityOptions, KnownHosts, SecurityLevel};
pub use transport::{ConnectTarget, SshTransport, Transport};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    Connected,
}

/// Output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandResult {
    /// Exit status 0 is the only success value for the commands this crate runs.
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// One authenticated SSH session to a single router.
///
/// Every operation takes `&mut self`, so commands on one session can never
/// overlap. Concurrent work against several routers uses one session each.
pub struct Session<T: Transport = SshTransport> {
    credentials: HostCredentials,
    security: ConnectionSecurityOptions,
    connect_timeout: Duration,
    transport: T,
    state: SessionState,
    recorder: Option<SessionRecorder>,
}

mod client;
mod keyfile;
mod recording;
mod security;
mod transport;
