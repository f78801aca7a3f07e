//! # openfam - router device-presence diagnostics over SSH
//!
//! `openfam` connects to a home router over SSH with key authentication and
//! strict host-key checking, reads the kernel neighbor table and the DHCP lease
//! table, and reconciles them into a list of devices with their addresses,
//! hostnames and reachability.
//!
//! ## Features
//!
//! - **Key-only authentication**: there is no password path anywhere in the API
//! - **Strict host verification**: unknown or changed host keys abort the connection
//! - **Lenient parsing**: malformed table rows are dropped, never fatal
//! - **Stale-lease safety**: expired leases never label a device
//! - **Typed failures**: every error maps to a [`error::FailureKind`]
//! - **Record and replay**: sessions can be captured as JSONL and replayed offline
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use openfam::credentials::HostCredentials;
//! use openfam::discovery::Reconciler;
//! use openfam::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = HostCredentials::new("192.168.1.1", 22, "root", "~/.ssh/id_ed25519");
//!     let mut reconciler = Reconciler::new(Session::new(credentials));
//!
//!     let devices = reconciler.discover().await;
//!     reconciler.close().await;
//!
//!     for device in devices? {
//!         println!(
//!             "{:<15} {} {:<20} {}",
//!             device.ip,
//!             device.mac,
//!             device.label.as_deref().unwrap_or("Unknown"),
//!             if device.reachable { "connected" } else { "offline" }
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Main Components
//!
//! - [`session::Session`] - one SSH session with connect / execute / disconnect
//! - [`tables`] - neighbor-table and lease-table parsers
//! - [`discovery::Reconciler`] - runs one discovery and merges the tables
//! - [`probe::check_access`] - verifies shell access to the router
//! - [`error`] - error types and failure classification
//! - [`config`] - timeouts, remote commands and SSH algorithm lists

pub mod config;
pub mod credentials;
pub mod discovery;
pub mod error;
pub mod probe;
pub mod session;
pub mod tables;
