//! Messaging pattern enumeration.
//!
//! A bridge endpoint is bound to exactly one of six patterns. The pattern
//! decides whether the endpoint binds or connects, and which directions of
//! traffic it carries.

use std::fmt;

/// Whether an endpoint listens on its address or dials it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Treat the address as a local listen address.
    Bind,
    /// Treat the address as a remote address to dial.
    Connect,
}

/// Messaging patterns exposed through the bridge.
///
/// Discriminants follow the ZMQ_TYPE numbering so they can cross the C
/// boundary unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Pattern {
    /// Publisher, broadcasts topic-framed messages to subscribers
    Pub = 1,

    /// Subscriber, receives published messages matching its topic filter
    Sub = 2,

    /// Synchronous request client (strict send/receive alternation)
    Req = 3,

    /// Synchronous reply server (receive, then reply)
    Rep = 4,

    /// Pipeline sink
    Pull = 7,

    /// Pipeline source
    Push = 8,
}

impl Pattern {
    /// All patterns, in ZMQ_TYPE order.
    pub const ALL: [Pattern; 6] = [
        Pattern::Pub,
        Pattern::Sub,
        Pattern::Req,
        Pattern::Rep,
        Pattern::Pull,
        Pattern::Push,
    ];

    /// Get the pattern as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
        }
    }

    /// Server-style patterns bind, client-style patterns connect.
    pub fn direction(&self) -> Direction {
        match self {
            Self::Pub | Self::Rep | Self::Pull => Direction::Bind,
            Self::Sub | Self::Req | Self::Push => Direction::Connect,
        }
    }

    /// Whether frames can be sent through this pattern.
    pub fn can_send(&self) -> bool {
        !matches!(self, Self::Sub | Self::Pull)
    }

    /// Whether frames can be received through this pattern.
    pub fn can_recv(&self) -> bool {
        !matches!(self, Self::Pub | Self::Push)
    }

    /// Check if this pattern is compatible with the given peer pattern.
    pub fn is_compatible(&self, peer: Pattern) -> bool {
        matches!(
            (self, peer),
            (Self::Pub, Self::Sub)
                | (Self::Sub, Self::Pub)
                | (Self::Req, Self::Rep)
                | (Self::Rep, Self::Req)
                | (Self::Push, Self::Pull)
                | (Self::Pull, Self::Push)
        )
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_display() {
        assert_eq!(Pattern::Pub.to_string(), "PUB");
        assert_eq!(Pattern::Pull.to_string(), "PULL");
        assert_eq!(Pattern::Req.to_string(), "REQ");
    }

    #[test]
    fn test_direction() {
        for pattern in Pattern::ALL {
            let expected = matches!(pattern, Pattern::Pub | Pattern::Rep | Pattern::Pull);
            assert_eq!(pattern.direction() == Direction::Bind, expected, "{pattern}");
        }
    }

    #[test]
    fn test_pattern_compatibility() {
        assert!(Pattern::Req.is_compatible(Pattern::Rep));
        assert!(Pattern::Rep.is_compatible(Pattern::Req));
        assert!(Pattern::Push.is_compatible(Pattern::Pull));
        assert!(Pattern::Sub.is_compatible(Pattern::Pub));

        // Incompatible pairs
        assert!(!Pattern::Sub.is_compatible(Pattern::Pull));
        assert!(!Pattern::Pub.is_compatible(Pattern::Pub));
        assert!(!Pattern::Req.is_compatible(Pattern::Pull));
    }

    #[test]
    fn test_traffic_direction() {
        assert!(Pattern::Pub.can_send() && !Pattern::Pub.can_recv());
        assert!(!Pattern::Sub.can_send() && Pattern::Sub.can_recv());
        assert!(Pattern::Req.can_send() && Pattern::Req.can_recv());
        assert!(!Pattern::Pull.can_send());
        assert!(!Pattern::Push.can_recv());
    }
}
