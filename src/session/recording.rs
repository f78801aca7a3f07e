use super::*;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single recorded session event.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionRecordEntry {
    pub ts_ms: u128,
    pub event: SessionEvent,
}

/// Supported recorded event types.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    ConnectionEstablished {
        device_addr: String,
    },
    ConnectionClosed {
        reason: String,
    },
    CommandExecuted {
        command: String,
        stdout: String,
        #[serde(default)]
        stderr: String,
        exit_status: i32,
    },
}

/// In-memory session recorder. Clones share the same event log.
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    entries: Arc<Mutex<Vec<SessionRecordEntry>>>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, event: SessionEvent) -> Result<(), ConnectError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| ConnectError::Recording(format!("record lock error: {e}")))?;
        guard.push(SessionRecordEntry {
            ts_ms: now_ms(),
            event,
        });
        Ok(())
    }

    /// Snapshot all records.
    pub fn entries(&self) -> Result<Vec<SessionRecordEntry>, ConnectError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| ConnectError::Recording(format!("record lock error: {e}")))?;
        Ok(guard.clone())
    }

    /// Export records as JSONL.
    pub fn to_jsonl(&self) -> Result<String, ConnectError> {
        let entries = self.entries()?;
        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            let line = serde_json::to_string(&entry)
                .map_err(|e| ConnectError::Recording(format!("record encode error: {e}")))?;
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    /// Restore recorder from JSONL lines. Blank lines are ignored.
    pub fn from_jsonl(jsonl: &str) -> Result<Self, ConnectError> {
        let mut parsed = Vec::new();
        for line in jsonl.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: SessionRecordEntry = serde_json::from_str(line)
                .map_err(|e| ConnectError::Recording(format!("record decode error: {e}")))?;
            parsed.push(entry);
        }

        Ok(Self {
            entries: Arc::new(Mutex::new(parsed)),
        })
    }
}

/// Offline transport that answers commands from a recorded session.
///
/// Commands are matched in recording order: `execute` consumes the next
/// `command_executed` entry for the same command line, skipping unrelated
/// entries before it.
#[derive(Debug, Clone, Default)]
pub struct ReplayTransport {
    entries: Vec<SessionRecordEntry>,
    cursor: usize,
    handshakes: usize,
}

impl ReplayTransport {
    pub fn from_recorder(recorder: &SessionRecorder) -> Result<Self, ConnectError> {
        let entries = recorder.entries()?;
        Ok(Self {
            entries,
            ..Default::default()
        })
    }

    pub fn from_jsonl(jsonl: &str) -> Result<Self, ConnectError> {
        let recorder = SessionRecorder::from_jsonl(jsonl)?;
        Self::from_recorder(&recorder)
    }

    /// Number of `connect` calls that reached this transport.
    pub fn handshakes(&self) -> usize {
        self.handshakes
    }

    /// Recorded commands not consumed yet.
    pub fn remaining_commands(&self) -> Vec<&str> {
        self.entries[self.cursor..]
            .iter()
            .filter_map(|entry| match &entry.event {
                SessionEvent::CommandExecuted { command, .. } => Some(command.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn connect(&mut self, target: &ConnectTarget) -> Result<(), ConnectError> {
        self.handshakes += 1;
        trace!(
            "Replaying session for {}@{}:{}",
            target.username, target.host, target.port
        );
        Ok(())
    }

    async fn execute(&mut self, command: &str) -> Result<CommandResult, ConnectError> {
        while self.cursor < self.entries.len() {
            let entry = &self.entries[self.cursor];
            self.cursor += 1;

            if let SessionEvent::CommandExecuted {
                command: recorded_command,
                stdout,
                stderr,
                exit_status,
            } = &entry.event
                && recorded_command == command
            {
                return Ok(CommandResult {
                    stdout: stdout.clone(),
                    stderr: stderr.clone(),
                    exit_status: *exit_status,
                });
            }
        }

        Err(ConnectError::ReplayMismatch(format!(
            "no replayable output found for command '{command}'"
        )))
    }

    async fn disconnect(&mut self) -> Result<(), ConnectError> {
        Ok(())
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{"ts_ms":1,"event":{"kind":"connection_established","device_addr":"root@192.168.1.1:22"}}
{"ts_ms":2,"event":{"kind":"command_executed","command":"date +%s","stdout":"1700000000\n","stderr":"","exit_status":0}}

{"ts_ms":3,"event":{"kind":"command_executed","command":"uname -a","stdout":"Linux OpenWrt","exit_status":0}}
"#;

    fn target() -> ConnectTarget {
        ConnectTarget {
            host: "192.168.1.1".to_string(),
            port: 22,
            username: "root".to_string(),
            key_path: PathBuf::from("/keys/id"),
            security: ConnectionSecurityOptions::default(),
            connect_timeout: config::CONNECT_TIMEOUT,
        }
    }

    #[test]
    fn recorder_jsonl_roundtrip() {
        let recorder = SessionRecorder::new();
        recorder
            .record_event(SessionEvent::CommandExecuted {
                command: "uci version".to_string(),
                stdout: "21.02".to_string(),
                stderr: String::new(),
                exit_status: 0,
            })
            .expect("record");

        let jsonl = recorder.to_jsonl().expect("encode jsonl");
        let restored = SessionRecorder::from_jsonl(&jsonl).expect("decode jsonl");
        let entries = restored.entries().expect("entries");

        assert_eq!(entries.len(), 1);
        assert!(matches!(
            &entries[0].event,
            SessionEvent::CommandExecuted { command, exit_status: 0, .. } if command == "uci version"
        ));
    }

    #[test]
    fn malformed_line_is_a_recording_error() {
        let err = SessionRecorder::from_jsonl("{not json}").expect_err("bad jsonl");
        assert!(matches!(err, ConnectError::Recording(_)));
    }

    #[tokio::test]
    async fn replay_skips_to_matching_command() {
        let mut replay = ReplayTransport::from_jsonl(FIXTURE).expect("fixture");
        replay.connect(&target()).await.expect("connect");

        let out = replay.execute("uname -a").await.expect("uname");
        assert_eq!(out.stdout, "Linux OpenWrt");
        assert!(out.stderr.is_empty());

        let err = replay.execute("date +%s").await.expect_err("already passed");
        assert!(matches!(err, ConnectError::ReplayMismatch(_)));
        assert_eq!(replay.handshakes(), 1);
    }

    #[test]
    fn remaining_commands_lists_unconsumed_entries() {
        let replay = ReplayTransport::from_jsonl(FIXTURE).expect("fixture");
        assert_eq!(replay.remaining_commands(), vec!["date +%s", "uname -a"]);
    }

    #[test]
    fn poisoned_recorder_cannot_seed_a_replay() {
        let recorder = SessionRecorder::new();
        let shared = recorder.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.entries.lock().expect("lock");
            panic!("poison the recorder");
        })
        .join();

        let err = ReplayTransport::from_recorder(&recorder).expect_err("poisoned");
        assert!(matches!(err, ConnectError::Recording(_)));
    }
}
