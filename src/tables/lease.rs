//! DHCP lease table parser.
//!
//! Each dnsmasq lease row is `expiry mac ip label client-id`, where `expiry`
//! is epoch seconds and `*` stands for "no label".

use std::collections::HashMap;

use log::trace;
use serde::{Deserialize, Serialize};

use super::MacAddr;

const MIN_COLUMNS: usize = 4;
const NO_LABEL: &str = "*";

/// One row of the lease table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Expiry as epoch seconds.
    pub expiry: i64,
    pub mac: MacAddr,
    pub ip: String,
    pub label: Option<String>,
}

impl LeaseRecord {
    /// A lease is active only while its expiry lies strictly after `reference_time`.
    pub fn is_active(&self, reference_time: i64) -> bool {
        self.expiry > reference_time
    }
}

/// Parses every well-formed lease row, active or not.
pub fn parse_leases(output: &str) -> Vec<LeaseRecord> {
    output.lines().filter_map(parse_row).collect()
}

fn parse_row(line: &str) -> Option<LeaseRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < MIN_COLUMNS {
        trace!("Skipping short lease row: {:?}", line);
        return None;
    }

    let Ok(expiry) = columns[0].parse::<i64>() else {
        trace!("Skipping lease row with invalid expiry: {:?}", line);
        return None;
    };
    let Ok(mac) = columns[1].parse::<MacAddr>() else {
        trace!("Skipping lease row with invalid hardware address: {:?}", line);
        return None;
    };
    let label = match columns[3] {
        NO_LABEL => None,
        label => Some(label.to_string()),
    };

    Some(LeaseRecord {
        expiry,
        mac,
        ip: columns[2].to_string(),
        label,
    })
}

/// Label lookup built from active, labelled leases only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseIndex {
    by_mac: HashMap<MacAddr, String>,
    by_ip: HashMap<String, String>,
}

impl LeaseIndex {
    /// Indexes labels of leases that expire after `reference_time`.
    ///
    /// Expired leases contribute nothing, even when no newer lease exists for
    /// the same device. With duplicate keys the later row wins.
    pub fn build(records: &[LeaseRecord], reference_time: i64) -> Self {
        let mut index = Self::default();
        for record in records {
            if !record.is_active(reference_time) {
                continue;
            }
            let Some(label) = record.label.as_ref() else {
                continue;
            };
            index.by_mac.insert(record.mac, label.clone());
            index.by_ip.insert(record.ip.clone(), label.clone());
        }
        index
    }

    /// Parses `output` and indexes it in one step.
    pub fn from_output(output: &str, reference_time: i64) -> Self {
        Self::build(&parse_leases(output), reference_time)
    }

    pub fn by_mac(&self, mac: &MacAddr) -> Option<&str> {
        self.by_mac.get(mac).map(String::as_str)
    }

    pub fn by_ip(&self, ip: &str) -> Option<&str> {
        self.by_ip.get(ip).map(String::as_str)
    }

    /// Looks up by hardware address first, then by network address.
    pub fn label_for(&self, mac: &MacAddr, ip: &str) -> Option<&str> {
        self.by_mac(mac).or_else(|| self.by_ip(ip))
    }

    pub fn is_empty(&self) -> bool {
        self.by_mac.is_empty() && self.by_ip.is_empty()
    }
}
