//! Socket configuration options
//!
//! The subset of libzmq socket options (zmq_setsockopt) the bridge applies
//! when it creates an endpoint.

use std::time::Duration;

/// Default high water mark, in messages.
pub const DEFAULT_HWM: usize = 1000;

/// Socket configuration options.
///
/// # Examples
///
/// ```
/// use msgbridge_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_linger(Some(Duration::ZERO))
///     .with_recv_hwm(64);
/// assert!(opts.is_zero_linger());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    /// Linger timeout (ZMQ_LINGER)
    ///
    /// Time to wait for pending messages to be sent before closing socket.
    /// - `None`: Wait indefinitely
    /// - `Some(Duration::ZERO)`: Close immediately, discard pending messages
    /// - `Some(duration)`: Wait up to duration for messages to be sent
    pub linger: Option<Duration>,

    /// High water mark for sending (ZMQ_SNDHWM)
    ///
    /// Maximum number of messages to queue for sending.
    pub send_hwm: usize,

    /// High water mark for receiving (ZMQ_RCVHWM)
    ///
    /// Maximum number of messages to queue for receiving. PUB drops messages
    /// for a subscriber at this mark; PUSH and REQ block.
    pub recv_hwm: usize,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            linger: Some(Duration::ZERO),
            send_hwm: DEFAULT_HWM,
            recv_hwm: DEFAULT_HWM,
        }
    }
}

impl SocketOptions {
    /// Create options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the linger period.
    #[must_use]
    pub const fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = linger;
        self
    }

    /// Set the send high water mark.
    #[must_use]
    pub const fn with_send_hwm(mut self, hwm: usize) -> Self {
        self.send_hwm = hwm;
        self
    }

    /// Set the receive high water mark.
    #[must_use]
    pub const fn with_recv_hwm(mut self, hwm: usize) -> Self {
        self.recv_hwm = hwm;
        self
    }

    /// Whether close discards pending messages immediately.
    #[must_use]
    pub fn is_zero_linger(&self) -> bool {
        self.linger == Some(Duration::ZERO)
    }

    /// Linger in the libzmq encoding: -1 for infinite, otherwise milliseconds.
    #[must_use]
    pub fn linger_millis(&self) -> i32 {
        match self.linger {
            None => -1,
            Some(d) => i32::try_from(d.as_millis()).unwrap_or(i32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SocketOptions::default();
        assert!(opts.is_zero_linger());
        assert_eq!(opts.send_hwm, DEFAULT_HWM);
        assert_eq!(opts.recv_hwm, DEFAULT_HWM);
    }

    #[test]
    fn test_linger_millis() {
        assert_eq!(SocketOptions::new().linger_millis(), 0);
        assert_eq!(SocketOptions::new().with_linger(None).linger_millis(), -1);
        assert_eq!(
            SocketOptions::new()
                .with_linger(Some(Duration::from_millis(250)))
                .linger_millis(),
            250
        );
        assert_eq!(
            SocketOptions::new()
                .with_linger(Some(Duration::from_secs(u64::MAX / 1000)))
                .linger_millis(),
            i32::MAX
        );
    }
}
