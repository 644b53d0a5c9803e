// Allow large error types - Error carries OIDs inline for debugging
// convenience, and boxing them would push allocations onto every failure
// path for a marginal size win.
#![allow(clippy::result_large_err)]

//! # snmp2c
//!
//! Async SNMPv2c client library for Rust.
//!
//! ## Features
//!
//! - `get`, `get_next`, `get_bulk`, `set`, plus `walk` / `bulk_walk`
//!   subtree traversal
//! - Many in-flight requests multiplexed over one UDP socket per session,
//!   each with its own timeout and retry budget
//! - Hand-rolled BER codec covering the SMIv2 type set, zero-copy on decode
//! - Passive SNMPv2-Trap reception with community filtering
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp2c::{Snmp, oid};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> snmp2c::Result<()> {
//!     let snmp = Snmp::builder("192.0.2.1")
//!         .community("public")
//!         .timeout(Duration::from_secs(2))
//!         .retries(2)
//!         .build();
//!
//!     // Scalar reads
//!     for vb in snmp.get(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]).await? {
//!         println!("sysDescr: {}", vb.value);
//!     }
//!
//!     // Subtree traversal
//!     let system = snmp.walk(oid!(1, 3, 6, 1, 2, 1, 1)).collect().await?;
//!     for vb in system {
//!         println!("{}", vb);
//!     }
//!
//!     snmp.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Receiving Traps
//!
//! ```rust,no_run
//! use snmp2c::TrapListener;
//!
//! #[tokio::main]
//! async fn main() -> snmp2c::Result<()> {
//!     let listener = TrapListener::builder()
//!         .bind("0.0.0.0:162")
//!         .build(|trap, source| {
//!             println!("trap from {} ({} varbinds)", source, trap.varbinds.len());
//!         })
//!         .await?;
//!     listener.run().await
//! }
//! ```

pub mod ber;
pub mod error;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod session;
pub mod trap;
pub mod value;
pub mod varbind;
pub mod walk;

mod request_id;
mod transport;
pub(crate) mod util;

pub use error::{Error, ErrorStatus, MalformedKind, Result};
pub use message::Message;
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use session::{Snmp, SnmpBuilder};
pub use trap::{TrapListener, TrapListenerBuilder, TrapMessage};
pub use value::Value;
pub use varbind::VarBind;
pub use walk::{BulkWalk, Walk};
