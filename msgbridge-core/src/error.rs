/// Transport Error Types
///
/// Errors reported by a transport implementation. The bridge converts every
/// one of these into a status code at its boundary.

use std::io;
use thiserror::Error;

use crate::endpoint::EndpointError;
use crate::pattern::Pattern;

/// Main error type for transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    /// IO error during socket operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Address could not be parsed or is not served by this transport
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    /// The pattern does not support the requested operation
    #[error("{op} is not supported on a {pattern} socket")]
    Unsupported { pattern: Pattern, op: &'static str },

    /// Operation issued out of order (e.g. REQ sending twice)
    #[error("Operation cannot be accomplished in current state: {0}")]
    InvalidState(String),

    /// Peer bound with a pattern that cannot talk to ours
    #[error("Incompatible peer: {local} cannot connect to {peer}")]
    Incompatible { local: Pattern, peer: Pattern },

    /// Error reported by an external transport library
    #[error("Transport backend error: {0}")]
    Backend(String),
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// Create an unsupported-operation error
    #[must_use]
    pub const fn unsupported(pattern: Pattern, op: &'static str) -> Self {
        Self::Unsupported { pattern, op }
    }

    /// Create an invalid state error with a message
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a backend error with a message
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Check if this error came from an unusable address
    #[must_use]
    pub fn is_address_error(&self) -> bool {
        match self {
            Self::Endpoint(_) | Self::Incompatible { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::AddrInUse
                    | io::ErrorKind::AddrNotAvailable
                    | io::ErrorKind::InvalidInput
                    | io::ErrorKind::NotFound
                    | io::ErrorKind::ConnectionRefused
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TransportError::unsupported(Pattern::Pub, "receive");
        assert_eq!(err.to_string(), "receive is not supported on a PUB socket");

        let err = TransportError::Incompatible {
            local: Pattern::Sub,
            peer: Pattern::Pull,
        };
        assert_eq!(err.to_string(), "Incompatible peer: SUB cannot connect to PULL");
    }

    #[test]
    fn test_classification() {
        let busy = TransportError::from(io::Error::new(io::ErrorKind::AddrInUse, "taken"));
        assert!(busy.is_address_error());

        let again = TransportError::from(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(!again.is_address_error());

        assert!(!TransportError::backend("boom").is_address_error());
    }
}
