//! Bridge error type.
//!
//! Every transport failure is caught at the bridge boundary and turned into
//! one of these variants; [`BridgeError::status`] gives the code a host sees.

use msgbridge_core::error::TransportError;
use msgbridge_core::pattern::Pattern;
use thiserror::Error;

use crate::handle::Handle;
use crate::status::Status;

/// Failure of a bridge operation.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// No live context: `initialize` was never called or `shutdown` ran
    #[error("Context not initialized")]
    NotInitialized,

    /// The transport context could not be opened
    #[error("Failed to initialize {transport} context: {source}")]
    Init {
        transport: &'static str,
        #[source]
        source: TransportError,
    },

    /// The transport refused to create an endpoint or apply its options
    #[error("Failed to create {pattern} socket: {source}")]
    Socket {
        pattern: Pattern,
        #[source]
        source: TransportError,
    },

    /// Binding to a local address failed
    #[error("Failed to bind {pattern} socket to {endpoint}: {source}")]
    Bind {
        pattern: Pattern,
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// Connecting to a remote address failed
    #[error("Failed to connect {pattern} socket to {endpoint}: {source}")]
    Connect {
        pattern: Pattern,
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// The handle space ran out
    #[error("No socket IDs left in this context")]
    HandlesExhausted,

    /// Unknown, closed, or non-positive handle
    #[error("Invalid socket ID: {0}")]
    InvalidSocket(Handle),

    /// A frame was not accepted by the transport
    #[error("Failed to send {frame}: {source}")]
    Send {
        frame: &'static str,
        #[source]
        source: TransportError,
    },

    /// Transport failure while receiving
    #[error("Receive error: {0}")]
    Receive(#[source] TransportError),

    /// Transport failure while polling for readability
    #[error("Poll error: {0}")]
    Poll(#[source] TransportError),

    /// A host passed an argument the bridge cannot use (null pointer,
    /// negative size, non UTF-8 string)
    #[error("Invalid argument: {reason}")]
    InvalidArgument { status: Status, reason: String },
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Create an invalid argument error reported with `status`
    pub fn invalid_argument(status: Status, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            status,
            reason: reason.into(),
        }
    }

    /// Status code reported to hosts for this error.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::NotInitialized | Self::Init { .. } => Status::InitError,
            Self::Socket { .. } | Self::HandlesExhausted => Status::SocketError,
            Self::Bind { .. } => Status::BindError,
            Self::Connect { .. } => Status::ConnectError,
            Self::InvalidSocket(_) => Status::InvalidSocket,
            Self::Send { .. } => Status::SendError,
            Self::Receive(_) | Self::Poll(_) => Status::ReceiveError,
            Self::InvalidArgument { status, .. } => *status,
        }
    }

    /// The underlying transport error, if any.
    #[must_use]
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Init { source, .. }
            | Self::Socket { source, .. }
            | Self::Bind { source, .. }
            | Self::Connect { source, .. }
            | Self::Send { source, .. }
            | Self::Receive(source)
            | Self::Poll(source) => Some(source),
            _ => None,
        }
    }
}
