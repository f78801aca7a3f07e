//! Device discovery: one run against one router.
//!
//! A [`Reconciler`] reads the router clock, the neighbor table and the lease
//! table over its [`Session`], then merges them into [`DeviceView`]s. The
//! neighbor table is the only source of devices; leases only supply labels.

use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{CLOCK_COMMAND, LEASE_TABLE_COMMAND, NEIGHBOR_TABLE_COMMAND};
use crate::error::DiscoveryError;
use crate::session::{Session, SshTransport, Transport};
use crate::tables::{LeaseIndex, NeighborRecord, parse_neighbors};

/// Caller-facing view of one device known to the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeviceView {
    /// Upper-case, colon-separated hardware address.
    pub mac: String,
    pub ip: String,
    pub interface: String,
    /// Hostname from an active lease, if any.
    #[serde(rename = "hostname", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether the neighbor entry is complete.
    #[serde(rename = "connected")]
    pub reachable: bool,
}

/// Counts shown under a device listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeviceSummary {
    pub total: usize,
    pub connected: usize,
    pub offline: usize,
}

impl DeviceSummary {
    pub fn from_devices(devices: &[DeviceView]) -> Self {
        let connected = devices.iter().filter(|d| d.reachable).count();
        Self {
            total: devices.len(),
            connected,
            offline: devices.len() - connected,
        }
    }
}

/// Splits devices into (connected, offline), keeping their order.
pub fn partition_by_reachability(devices: &[DeviceView]) -> (Vec<&DeviceView>, Vec<&DeviceView>) {
    devices.iter().partition(|d| d.reachable)
}

/// Merges neighbor records with lease labels and sorts by network address.
///
/// Labels are looked up by hardware address first, then by network address.
/// The sort compares the textual address and is stable.
pub fn reconcile(neighbors: Vec<NeighborRecord>, leases: &LeaseIndex) -> Vec<DeviceView> {
    let mut devices: Vec<DeviceView> = neighbors
        .into_iter()
        .map(|n| DeviceView {
            label: leases.label_for(&n.mac, &n.ip).map(str::to_string),
            mac: n.mac.to_string(),
            ip: n.ip,
            interface: n.interface,
            reachable: n.reachable,
        })
        .collect();

    devices.sort_by(|a, b| a.ip.cmp(&b.ip));
    devices
}

/// Parses the output of the clock command as epoch seconds.
pub fn parse_reference_time(stdout: &str) -> Result<i64, DiscoveryError> {
    let raw = stdout.trim();
    raw.parse::<i64>()
        .map_err(|e| DiscoveryError::ClockRead {
            message: format!("unexpected clock output '{raw}': {e}"),
            source: None,
        })
}

/// Runs discovery over an owned session.
pub struct Reconciler<T: Transport = SshTransport> {
    session: Session<T>,
}

impl<T: Transport> Reconciler<T> {
    pub fn new(session: Session<T>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Hands the session back, still connected if `discover` connected it.
    pub fn into_session(self) -> Session<T> {
        self.session
    }

    /// Disconnects the session and consumes the reconciler.
    pub async fn close(mut self) {
        self.session.disconnect().await;
    }

    /// Performs one discovery run.
    ///
    /// Clock and neighbor-table failures abort the run; a failed lease read
    /// only costs the labels. An empty list means the router knows no
    /// neighbors.
    pub async fn discover(&mut self) -> Result<Vec<DeviceView>, DiscoveryError> {
        let device_addr = self.session.credentials().device_addr();

        self.session.connect().await?;

        let reference_time = self.read_reference_time().await?;
        debug!("{} Reference time: {}", device_addr, reference_time);

        let neighbor_output = self.read_neighbor_table().await?;
        let neighbors = parse_neighbors(&neighbor_output);

        let leases = self.read_lease_index(reference_time).await;

        let devices = reconcile(neighbors, &leases);
        debug!("{} Discovered {} devices", device_addr, devices.len());
        Ok(devices)
    }

    async fn read_reference_time(&mut self) -> Result<i64, DiscoveryError> {
        let result = self
            .session
            .execute(CLOCK_COMMAND)
            .await
            .map_err(|e| DiscoveryError::ClockRead {
                message: format!("'{CLOCK_COMMAND}' could not be run"),
                source: Some(e),
            })?;
        if !result.success() {
            return Err(DiscoveryError::ClockRead {
                message: format!(
                    "'{CLOCK_COMMAND}' exited with {}: {}",
                    result.exit_status,
                    result.stderr.trim()
                ),
                source: None,
            });
        }
        parse_reference_time(&result.stdout)
    }

    async fn read_neighbor_table(&mut self) -> Result<String, DiscoveryError> {
        let result = self
            .session
            .execute(NEIGHBOR_TABLE_COMMAND)
            .await
            .map_err(|e| DiscoveryError::NeighborTable {
                message: format!("'{NEIGHBOR_TABLE_COMMAND}' could not be run"),
                source: Some(e),
            })?;
        if !result.success() {
            return Err(DiscoveryError::NeighborTable {
                message: format!(
                    "'{NEIGHBOR_TABLE_COMMAND}' exited with {}: {}",
                    result.exit_status,
                    result.stderr.trim()
                ),
                source: None,
            });
        }
        Ok(result.stdout)
    }

    async fn read_lease_index(&mut self, reference_time: i64) -> LeaseIndex {
        match self.session.execute(LEASE_TABLE_COMMAND).await {
            Ok(result) if result.success() => LeaseIndex::from_output(&result.stdout, reference_time),
            Ok(result) => {
                warn!(
                    "'{}' exited with {}, continuing without hostnames: {}",
                    LEASE_TABLE_COMMAND,
                    result.exit_status,
                    result.stderr.trim()
                );
                LeaseIndex::default()
            }
            Err(e) => {
                warn!("Lease table unavailable, continuing without hostnames: {}", e);
                LeaseIndex::default()
            }
        }
    }
}
