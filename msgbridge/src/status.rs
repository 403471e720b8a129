//! Status codes returned across the C boundary.

use std::fmt;

/// Result of a bridge operation as seen by a host.
///
/// Negative values are failures; `Ok` and `NoMessage` are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// Operation succeeded
    Ok = 0,
    /// A non-blocking receive found nothing queued
    NoMessage = 1,
    /// Context missing or could not be created
    InitError = -1,
    /// Endpoint creation rejected by the transport
    SocketError = -2,
    /// Local address unusable
    BindError = -3,
    /// Remote address unusable
    ConnectError = -4,
    /// Frame not accepted by the transport
    SendError = -5,
    /// Transport failure while receiving or polling
    ReceiveError = -6,
    /// Unknown or closed handle
    InvalidSocket = -7,
}

impl Status {
    /// The integer code handed to hosts.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Whether the requested effect happened (or, for `NoMessage`, whether
    /// nothing went wrong).
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::NoMessage)
    }

    /// Symbolic name as used in the C header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "MSGBRIDGE_OK",
            Self::NoMessage => "MSGBRIDGE_NO_MESSAGE",
            Self::InitError => "MSGBRIDGE_ERROR_INIT",
            Self::SocketError => "MSGBRIDGE_ERROR_SOCKET",
            Self::BindError => "MSGBRIDGE_ERROR_BIND",
            Self::ConnectError => "MSGBRIDGE_ERROR_CONNECT",
            Self::SendError => "MSGBRIDGE_ERROR_SEND",
            Self::ReceiveError => "MSGBRIDGE_ERROR_RECEIVE",
            Self::InvalidSocket => "MSGBRIDGE_ERROR_INVALID_SOCKET",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_header() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::NoMessage.code(), 1);
        assert_eq!(Status::InitError.code(), -1);
        assert_eq!(Status::SocketError.code(), -2);
        assert_eq!(Status::BindError.code(), -3);
        assert_eq!(Status::ConnectError.code(), -4);
        assert_eq!(Status::SendError.code(), -5);
        assert_eq!(Status::ReceiveError.code(), -6);
        assert_eq!(Status::InvalidSocket.code(), -7);
    }

    #[test]
    fn test_no_message_is_not_a_failure() {
        assert!(Status::NoMessage.is_ok());
        assert!(!Status::InvalidSocket.is_ok());
        assert_eq!(Status::NoMessage.to_string(), "MSGBRIDGE_NO_MESSAGE");
    }
}
