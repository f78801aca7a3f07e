//! Parsers for the two text tables the router exposes.
//!
//! - [`neighbor`] reads the kernel neighbor table (`/proc/net/arp`)
//! - [`lease`] reads the dnsmasq lease file (`/tmp/dhcp.leases`)
//!
//! Both parsers are stateless and lenient: a malformed row is dropped and
//! never fails the whole parse.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod lease;
pub mod neighbor;

pub use lease::{LeaseIndex, LeaseRecord, parse_leases};
pub use neighbor::{NeighborRecord, parse_neighbors};

static MAC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    match Regex::new(r"^[0-9A-Fa-f]{2}(?:[:-][0-9A-Fa-f]{2}){5}$") {
        Ok(re) => re,
        Err(err) => panic!("invalid MAC_PATTERN regex: {err}"),
    }
});

/// A hardware address, displayed upper-case and colon-separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr([u8; 6]);

/// Returned when a string is not a six-octet hardware address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hardware address '{0}'")]
pub struct InvalidMac(pub String);

impl MacAddr {
    pub const ZERO: MacAddr = MacAddr([0; 6]);
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// All-zero and broadcast addresses mark incomplete or unusable entries.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::ZERO || *self == Self::BROADCAST
    }
}

impl FromStr for MacAddr {
    type Err = InvalidMac;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !MAC_PATTERN.is_match(s) {
            return Err(InvalidMac(s.to_string()));
        }
        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(s.split([':', '-'])) {
            *slot = u8::from_str_radix(part, 16).map_err(|_| InvalidMac(s.to_string()))?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
