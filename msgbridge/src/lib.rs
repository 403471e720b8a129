//! # msgbridge
//!
//! A handle-indexed messaging bridge. Hosts that cannot link a message
//! transport directly create endpoints through small integer handles and
//! exchange discrete frames over six patterns: PUB, SUB, REQ, REP, PUSH and
//! PULL.
//!
//! ## Architecture
//!
//! - **`msgbridge-core`**: patterns, addresses, options, the transport
//!   capability traits and a built-in in-process transport
//! - **`msgbridge-zmq`**: the same traits over libzmq (feature `zmq`)
//! - **`msgbridge`**: registry, bridge facade, status codes and the C ABI
//!   (this crate)
//!
//! ## Quick Start
//!
//! ```rust
//! use msgbridge::{Bridge, BridgeConfig};
//! use msgbridge_core::inproc::InprocTransport;
//!
//! # fn main() -> Result<(), msgbridge::BridgeError> {
//! let bridge: Bridge<InprocTransport> = Bridge::new(BridgeConfig::default());
//! bridge.initialize()?;
//!
//! let publisher = bridge.create_publisher("inproc://telemetry")?;
//! let subscriber = bridge.create_subscriber("inproc://telemetry", "vehicle")?;
//!
//! bridge.publish(publisher, "vehicle", b"speed=42")?;
//!
//! // Topic and payload arrive as two frames; always read them in pairs
//! let mut buffer = [0u8; 64];
//! let topic_len = bridge.receive(subscriber, &mut buffer)?;
//! assert_eq!(topic_len, Some(7));
//! let payload_len = bridge.receive(subscriber, &mut buffer)?.unwrap_or(0);
//! assert_eq!(&buffer[..payload_len], b"speed=42");
//!
//! bridge.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## C ABI
//!
//! Built as a `cdylib`, the crate exports the `msgbridge_*` functions of
//! [`ffi`], declared for C hosts in `include/msgbridge.h`. They drive one
//! process-wide bridge whose transport is in-process by default and libzmq
//! with the `zmq` feature.
//!
//! ## Safety
//!
//! `unsafe` code is confined to [`ffi`], where raw host pointers become
//! slices and strings.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod config;
pub mod dev_tracing;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod registry;
pub mod reporter;
pub mod status;

pub use bridge::Bridge;
pub use bytes::Bytes;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use handle::Handle;
pub use registry::{Registry, SocketSpec};
pub use reporter::ErrorReporter;
pub use status::Status;

#[cfg(feature = "zmq")]
pub use msgbridge_zmq::ZmqTransport;

/// Convenient imports for embedding the bridge.
pub mod prelude {
    pub use crate::{Bridge, BridgeConfig, BridgeError, Handle, Status};
    pub use msgbridge_core::prelude::{InprocTransport, Pattern, SocketOptions, Transport};
}
