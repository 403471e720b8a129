//! Endpoint handles.

use std::fmt;

/// Opaque integer identifying an endpoint to callers.
///
/// Issued from 1 upwards and never reused within one context lifetime.
/// Values ≤ 0 are never issued, so every operation rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(i32);

impl Handle {
    /// The first handle issued by a fresh context.
    pub const FIRST: Handle = Handle(1);

    /// Wrap a raw integer received from a host. No validation happens here;
    /// lookups reject unknown values.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The integer handed to hosts.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Whether this value could ever have been issued.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }

    pub(crate) fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<i32> for Handle {
    fn from(raw: i32) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(Handle::FIRST.is_valid());
        assert!(!Handle::from_raw(0).is_valid());
        assert!(!Handle::from_raw(-7).is_valid());
    }

    #[test]
    fn test_next_stops_at_max() {
        assert_eq!(Handle::FIRST.next(), Some(Handle::from_raw(2)));
        assert_eq!(Handle::from_raw(i32::MAX).next(), None);
    }
}
