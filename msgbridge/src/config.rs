//! Bridge configuration.
//!
//! Endpoint linger is not configurable: the bridge always closes endpoints
//! immediately, discarding anything unsent.

use msgbridge_core::options::{SocketOptions, DEFAULT_HWM};
use msgbridge_core::transport::ContextConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding [`BridgeConfig::io_threads`].
pub const ENV_IO_THREADS: &str = "MSGBRIDGE_IO_THREADS";
/// Environment variable overriding [`BridgeConfig::send_hwm`].
pub const ENV_SEND_HWM: &str = "MSGBRIDGE_SEND_HWM";
/// Environment variable overriding [`BridgeConfig::recv_hwm`].
pub const ENV_RECV_HWM: &str = "MSGBRIDGE_RECV_HWM";

/// Settings applied when the bridge opens its context and creates endpoints.
///
/// # Examples
///
/// ```
/// use msgbridge::BridgeConfig;
///
/// let config = BridgeConfig::default().with_recv_hwm(64);
/// assert_eq!(config.io_threads, 1);
/// assert_eq!(config.socket_options().recv_hwm, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Background I/O threads of the transport context
    pub io_threads: i32,
    /// Per-endpoint outgoing queue limit, in messages
    pub send_hwm: usize,
    /// Per-endpoint incoming queue limit, in messages
    pub recv_hwm: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            io_threads: 1,
            send_hwm: DEFAULT_HWM,
            recv_hwm: DEFAULT_HWM,
        }
    }
}

impl BridgeConfig {
    /// Defaults, overridden by `MSGBRIDGE_*` environment variables. Values
    /// that do not parse are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            io_threads: env_or(ENV_IO_THREADS, defaults.io_threads),
            send_hwm: env_or(ENV_SEND_HWM, defaults.send_hwm),
            recv_hwm: env_or(ENV_RECV_HWM, defaults.recv_hwm),
        }
    }

    /// Set the number of context I/O threads.
    #[must_use]
    pub const fn with_io_threads(mut self, io_threads: i32) -> Self {
        self.io_threads = io_threads;
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

    /// Context settings derived from this configuration.
    #[must_use]
    pub fn context_config(&self) -> ContextConfig {
        ContextConfig {
            io_threads: self.io_threads,
        }
    }

    /// Options applied to every endpoint: zero linger plus the queue limits.
    #[must_use]
    pub fn socket_options(&self) -> SocketOptions {
        SocketOptions::new()
            .with_linger(Some(Duration::ZERO))
            .with_send_hwm(self.send_hwm)
            .with_recv_hwm(self.recv_hwm)
    }
}

fn env_or<V: FromStr>(key: &str, default: V) -> V {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("[BRIDGE] Ignoring unparsable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_options_force_zero_linger() {
        let opts = BridgeConfig::default().with_send_hwm(10).socket_options();
        assert!(opts.is_zero_linger());
        assert_eq!(opts.send_hwm, 10);
        assert_eq!(opts.recv_hwm, DEFAULT_HWM);
    }

    #[test]
    fn test_env_or_falls_back() {
        // Keys unique to this test so parallel tests are unaffected
        env::set_var("MSGBRIDGE_TEST_BAD_VALUE", "lots");
        env::set_var("MSGBRIDGE_TEST_GOOD_VALUE", " 42 ");

        assert_eq!(env_or("MSGBRIDGE_TEST_BAD_VALUE", 7usize), 7);
        assert_eq!(env_or("MSGBRIDGE_TEST_GOOD_VALUE", 7usize), 42);
        assert_eq!(env_or("MSGBRIDGE_TEST_UNSET_VALUE", 3i32), 3);
    }

    #[test]
    fn test_context_config() {
        let config = BridgeConfig::default().with_io_threads(4);
        assert_eq!(config.context_config().io_threads, 4);
    }
}
