//! Transport capability traits.
//!
//! The bridge never touches a wire protocol itself. Everything it needs from
//! a message transport is expressed by these two traits:
//!
//! - [`Transport`] is the process context: it is opened once at bridge
//!   initialization and creates endpoints.
//! - [`TransportSocket`] is one endpoint: bind or connect, send a frame with a
//!   "more frames follow" flag, receive a frame without blocking, and wait for
//!   readability with a timeout.
//!
//! All socket methods take `&self`. Implementations decide how much
//! concurrent access to a single endpoint they tolerate and must serialize
//! internally where the underlying library is not thread-safe.

use bytes::Bytes;
use std::time::Duration;

use crate::error::Result;
use crate::options::SocketOptions;
use crate::pattern::Pattern;

/// Settings used when a transport context is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    /// Background I/O threads (libzmq `ZMQ_IO_THREADS`). A hint; transports
    /// without background threads ignore it.
    pub io_threads: i32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { io_threads: 1 }
    }
}

/// A transport context.
pub trait Transport: Send + Sync + Sized + 'static {
    /// Endpoint type produced by this transport.
    type Socket: TransportSocket;

    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Open a new context.
    fn open(config: &ContextConfig) -> Result<Self>;

    /// Create an endpoint of `pattern` with `options` applied. The endpoint
    /// is neither bound nor connected yet.
    fn socket(&self, pattern: Pattern, options: &SocketOptions) -> Result<Self::Socket>;
}

/// A single transport endpoint.
pub trait TransportSocket: Send + Sync + 'static {
    /// Pattern this endpoint was created with.
    fn pattern(&self) -> Pattern;

    /// Add a topic prefix filter. Only valid on SUB endpoints.
    fn subscribe(&self, prefix: &[u8]) -> Result<()>;

    /// Listen on a local address.
    fn bind(&self, endpoint: &str) -> Result<()>;

    /// Dial a remote address.
    fn connect(&self, endpoint: &str) -> Result<()>;

    /// Send one frame. `more` marks that further frames of the same message
    /// follow. May block when the pattern has no buffering room.
    fn send(&self, frame: &[u8], more: bool) -> Result<()>;

    /// Receive one frame without blocking. `Ok(None)` means nothing is queued.
    fn try_recv(&self) -> Result<Option<Bytes>>;

    /// Wait up to `timeout` for a frame to become receivable. A zero timeout
    /// never blocks.
    fn poll_readable(&self, timeout: Duration) -> Result<bool>;
}
