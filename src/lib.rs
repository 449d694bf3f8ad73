//! # snmpoll
//!
//! Async SNMP polling core for network device state and bandwidth.
//!
//! ## Features
//!
//! - SNMPv2c get/getnext/set with timeout and retransmission, correlated
//!   by request identifier
//! - Blocking subtree walks that return a complete snapshot
//! - Table reconstruction (rows by index, values by column)
//! - Counter sampling against the device's own clock and bit-rate
//!   derivation
//! - Batched parameter sets with cumulative or throttled delivery and
//!   per-target outcomes
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use snmpoll::{Client, Direction, mib};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> snmpoll::Result<()> {
//!     let client = Client::builder("192.0.2.1:161", "public")
//!         .timeout(Duration::from_secs(2))
//!         .max_retries(2)
//!         .connect()
//!         .await?;
//!
//!     // Reconstruct the interfaces table.
//!     let interfaces = client.table(&mib::if_entry()).await?;
//!     for row in interfaces.rows() {
//!         println!("{}: {:?}", row.index(), row.column(2));
//!     }
//!
//!     // Ten-second bandwidth measurement on ifIndex 3.
//!     let bps = client
//!         .link_bitrate(3, Duration::from_secs(10), Direction::Peak)
//!         .await?;
//!     println!("{} bit/s", bps);
//!
//!     Ok(())
//! }
//! ```

pub mod ber;
pub mod client;
pub mod error;
pub mod mib;
pub mod oid;
pub mod table;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod wire;

pub use client::{BatchResult, Client, ClientBuilder, ClientConfig, Direction, TimedSample};
pub use error::{
    DecodeErrorKind, Error, ErrorStatus, Result, SyntaxErrorKind, WalkAbortReason,
};
pub use oid::Oid;
pub use table::{Table, TableRow, build_table};
pub use transport::{RequestIds, UdpChannel};
pub use value::Value;
pub use varbind::VarBind;
