//! msgbridge Core
//!
//! This crate contains the transport-facing building blocks of the bridge:
//! - Messaging patterns and their bind/connect direction (`pattern`)
//! - Endpoint address parsing (`endpoint`)
//! - Socket options applied at creation (`options`)
//! - Topic prefix matching (`subscription`)
//! - Transport capability traits (`transport`)
//! - A channel-based in-process transport (`inproc`)
//! - Error types (`error`)

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod endpoint;
pub mod error;
pub mod inproc;
pub mod options;
pub mod pattern;
pub mod subscription;
pub mod transport;

// Small prelude so downstream crates can implement or drive a transport
// with one import.
pub mod prelude {
    pub use crate::endpoint::{Endpoint, EndpointError};
    pub use crate::error::{Result, TransportError};
    pub use crate::inproc::{InprocSocket, InprocTransport};
    pub use crate::options::SocketOptions;
    pub use crate::pattern::{Direction, Pattern};
    pub use crate::subscription::SubscriptionSet;
    pub use crate::transport::{ContextConfig, Transport, TransportSocket};
}
