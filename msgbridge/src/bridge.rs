//! Bridge facade.
//!
//! The operation surface hosts call: create an endpoint per pattern, send,
//! publish, receive, poll, close. Each operation checks the context first,
//! then the handle, then calls the transport; any failure is recorded as the
//! last error and returned as a [`BridgeError`].
//!
//! # Locking
//!
//! The context slot is an `RwLock`. Creation holds a read guard for its whole
//! run, so `shutdown` (write guard) can never interleave with a half-created
//! endpoint. Send, receive and poll hold it only while resolving the handle;
//! the transport call itself runs with no bridge lock held, so a blocking
//! send or a long poll stalls nothing but itself.
//!
//! Two threads may use the same handle at once. Whatever the transport
//! guarantees for concurrent use of one endpoint is all the bridge offers;
//! a REQ socket driven by two threads, for example, will see state errors.
//!
//! There is no way to cancel a send blocked in the transport. `shutdown`
//! removes the endpoint from the table but the blocked call keeps its
//! reference and returns only when the transport lets it.
//!
//! # Publish/subscribe framing
//!
//! [`Bridge::publish`] sends exactly two frames: the topic (its UTF-8 bytes,
//! no terminator) flagged "more follows", then the payload. A subscriber
//! sees them as two separate receives and must always read them in pairs;
//! after a single read the payload is still queued and the next read would
//! take it for a topic. If the topic frame is accepted but the payload is
//! not, the call fails and no retraction is possible.

use bytes::Bytes;
use msgbridge_core::pattern::Pattern;
use msgbridge_core::transport::{Transport, TransportSocket};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::handle::Handle;
use crate::registry::{Registry, SocketSpec};
use crate::reporter::ErrorReporter;
use crate::status::Status;

/// A bridge instance: one context slot, its registry, and a last-error string.
///
/// Starts uninitialized. Several instances can live side by side; each has
/// its own context, handle space and last error.
pub struct Bridge<T: Transport> {
    config: BridgeConfig,
    registry: RwLock<Option<Registry<T>>>,
    errors: ErrorReporter,
}

impl<T: Transport> Bridge<T> {
    /// Create an uninitialized bridge.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(None),
            errors: ErrorReporter::new(),
        }
    }

    /// Configuration this bridge was created with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Record a failure and hand it back.
    fn fail(&self, err: BridgeError) -> BridgeError {
        self.errors.record(err.to_string());
        err
    }

    fn report<R>(&self, result: Result<R>) -> Result<R> {
        result.map_err(|err| self.fail(err))
    }

    /// Record a failure detected outside the bridge (e.g. argument checks
    /// at the C boundary) and return its status.
    pub fn report_error(&self, err: BridgeError) -> Status {
        self.fail(err).status()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Open the transport context. Calling it on a live bridge is a no-op.
    ///
    /// A fresh context starts a fresh handle space: the first handle issued
    /// after (re-)initialization is 1.
    pub fn initialize(&self) -> Result<()> {
        let mut slot = self.registry.write();
        if slot.is_some() {
            return Ok(());
        }

        let context = T::open(&self.config.context_config());
        let context = self.report(context.map_err(|source| BridgeError::Init {
            transport: std::any::type_name::<T>(),
            source,
        }))?;

        debug!("[BRIDGE] Initialized {} context", context.name());
        *slot = Some(Registry::new(context));
        Ok(())
    }

    /// Close every endpoint, then release the context. No-op when not
    /// initialized.
    pub fn shutdown(&self) {
        let registry = self.registry.write().take();
        if let Some(registry) = registry {
            let closed = registry.close_all();
            let name = registry.context().name();
            drop(registry);
            debug!("[BRIDGE] Shut down {} context ({} sockets closed)", name, closed);
        }
    }

    /// Whether a context is live.
    pub fn is_initialized(&self) -> bool {
        self.registry.read().is_some()
    }

    /// Number of live endpoints (0 when not initialized).
    pub fn socket_count(&self) -> usize {
        self.registry.read().as_ref().map_or(0, Registry::len)
    }

    /// Fail with "not initialized" unless a context is live.
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(self.fail(BridgeError::NotInitialized))
        }
    }

    /// Check that `handle` names a live endpoint of a live context.
    pub fn validate(&self, handle: Handle) -> Result<()> {
        self.resolve(handle).map(|_| ())
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    /// Create an endpoint of `pattern` on `endpoint`, binding or connecting
    /// as the pattern dictates. `topic` is the SUB filter and ignored
    /// otherwise.
    pub fn create(&self, pattern: Pattern, endpoint: &str, topic: Option<&str>) -> Result<Handle> {
        let guard = self.registry.read();
        let result = match guard.as_ref() {
            None => Err(BridgeError::NotInitialized),
            Some(registry) => {
                let mut spec = SocketSpec::new(pattern, endpoint);
                if let Some(topic) = topic {
                    spec = spec.with_topic(topic.as_bytes());
                }
                registry.create(spec, &self.config.socket_options())
            }
        };
        drop(guard);
        self.report(result)
    }

    /// Bind a PUB endpoint.
    pub fn create_publisher(&self, endpoint: &str) -> Result<Handle> {
        self.create(Pattern::Pub, endpoint, None)
    }

    /// Connect a SUB endpoint filtered on `topic` (empty = every topic).
    pub fn create_subscriber(&self, endpoint: &str, topic: &str) -> Result<Handle> {
        self.create(Pattern::Sub, endpoint, Some(topic))
    }

    /// Connect a REQ endpoint.
    pub fn create_request(&self, endpoint: &str) -> Result<Handle> {
        self.create(Pattern::Req, endpoint, None)
    }

    /// Bind a REP endpoint.
    pub fn create_reply(&self, endpoint: &str) -> Result<Handle> {
        self.create(Pattern::Rep, endpoint, None)
    }

    /// Connect a PUSH endpoint.
    pub fn create_push(&self, endpoint: &str) -> Result<Handle> {
        self.create(Pattern::Push, endpoint, None)
    }

    /// Bind a PULL endpoint.
    pub fn create_pull(&self, endpoint: &str) -> Result<Handle> {
        self.create(Pattern::Pull, endpoint, None)
    }

    // ---------------------------------------------------------------------
    // Traffic
    // ---------------------------------------------------------------------

    /// Resolve a handle under the context read guard, releasing it before
    /// returning.
    fn resolve(&self, handle: Handle) -> Result<Arc<T::Socket>> {
        let guard = self.registry.read();
        let result = match guard.as_ref() {
            None => Err(BridgeError::NotInitialized),
            Some(registry) => registry.lookup(handle),
        };
        drop(guard);
        self.report(result)
    }

    /// Send `data` as a single frame.
    pub fn send(&self, handle: Handle, data: &[u8]) -> Result<()> {
        let socket = self.resolve(handle)?;
        trace!("[BRIDGE] Sending {} bytes on {}", data.len(), handle);
        self.report(
            socket
                .send(data, false)
                .map_err(|source| BridgeError::Send {
                    frame: "message",
                    source,
                }),
        )
    }

    /// Send the UTF-8 bytes of `text` as a single frame, without terminator.
    pub fn send_str(&self, handle: Handle, text: &str) -> Result<()> {
        self.send(handle, text.as_bytes())
    }

    /// Send a topic frame followed by a payload frame.
    pub fn publish(&self, handle: Handle, topic: &str, data: &[u8]) -> Result<()> {
        let socket = self.resolve(handle)?;
        trace!(
            "[BRIDGE] Publishing {} bytes under {:?} on {}",
            data.len(),
            topic,
            handle
        );

        let result = socket
            .send(topic.as_bytes(), true)
            .map_err(|source| BridgeError::Send {
                frame: "topic",
                source,
            })
            .and_then(|()| {
                socket.send(data, false).map_err(|source| BridgeError::Send {
                    frame: "payload",
                    source,
                })
            });
        self.report(result)
    }

    /// Take one frame without blocking, whole. `Ok(None)` means nothing is
    /// queued.
    pub fn receive_frame(&self, handle: Handle) -> Result<Option<Bytes>> {
        let socket = self.resolve(handle)?;
        self.report(socket.try_recv().map_err(BridgeError::Receive))
    }

    /// Take one frame without blocking and copy it into `buffer`.
    ///
    /// Returns `Ok(Some(n))` with the number of bytes copied, or `Ok(None)`
    /// when nothing is queued, in which case `buffer` is left untouched.
    ///
    /// A frame longer than `buffer` is silently truncated to its length and
    /// the rest of the frame is lost. Callers that need to detect this must
    /// compare `n` against the size they expect.
    pub fn receive(&self, handle: Handle, buffer: &mut [u8]) -> Result<Option<usize>> {
        let Some(frame) = self.receive_frame(handle)? else {
            return Ok(None);
        };

        let copied = frame.len().min(buffer.len());
        buffer[..copied].copy_from_slice(&frame[..copied]);
        if copied < frame.len() {
            trace!(
                "[BRIDGE] Truncated {}-byte frame to {} bytes on {}",
                frame.len(),
                copied,
                handle
            );
        }
        Ok(Some(copied))
    }

    /// Like [`Bridge::receive`], but reserves the last byte of `buffer` for
    /// a NUL terminator written after the copied bytes.
    ///
    /// The returned count excludes the terminator. An empty buffer has no
    /// room for the terminator and fails with a receive error.
    pub fn receive_text(&self, handle: Handle, buffer: &mut [u8]) -> Result<Option<usize>> {
        self.validate(handle)?;
        let Some(capacity) = buffer.len().checked_sub(1) else {
            return Err(self.fail(BridgeError::invalid_argument(
                Status::ReceiveError,
                "text buffer needs room for a terminator",
            )));
        };

        let received = self.receive(handle, &mut buffer[..capacity])?;
        if let Some(len) = received {
            buffer[len] = 0;
        }
        Ok(received)
    }

    /// Wait up to `timeout` for a frame to become receivable. A zero timeout
    /// returns at once.
    pub fn poll(&self, handle: Handle, timeout: Duration) -> Result<bool> {
        let socket = self.resolve(handle)?;
        self.report(socket.poll_readable(timeout).map_err(BridgeError::Poll))
    }

    /// Whether a frame is receivable right now. Same as a zero-timeout poll.
    pub fn check_message(&self, handle: Handle) -> Result<bool> {
        self.poll(handle, Duration::ZERO)
    }

    /// Close an endpoint. Returns whether the handle was live; closing an
    /// unknown or already closed handle does nothing and is not an error.
    pub fn close(&self, handle: Handle) -> bool {
        self.registry
            .read()
            .as_ref()
            .is_some_and(|registry| registry.close(handle))
    }

    /// Most recent failure message of this bridge, from any thread.
    pub fn last_error(&self) -> String {
        self.errors.last()
    }
}

impl<T: Transport> Default for Bridge<T> {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl<T: Transport> Drop for Bridge<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<T: Transport> std::fmt::Debug for Bridge<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("sockets", &self.socket_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgbridge_core::inproc::InprocTransport;

    fn bridge() -> Bridge<InprocTransport> {
        let bridge = Bridge::default();
        bridge.initialize().unwrap();
        bridge
    }

    #[test]
    fn test_requires_initialize() {
        let bridge: Bridge<InprocTransport> = Bridge::default();
        let err = bridge.create_pull("inproc://early").unwrap_err();
        assert_eq!(err.status(), Status::InitError);
        assert_eq!(bridge.last_error(), "Context not initialized");
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let bridge = bridge();
        let handle = bridge.create_pull("inproc://idem").unwrap();
        bridge.initialize().unwrap();
        bridge.validate(handle).unwrap();
    }

    #[test]
    fn test_receive_text_terminates() {
        let bridge = bridge();
        let pull = bridge.create_pull("inproc://text").unwrap();
        let push = bridge.create_push("inproc://text").unwrap();

        bridge.send_str(push, "hello").unwrap();
        let mut buffer = [0xffu8; 4];
        assert_eq!(bridge.receive_text(pull, &mut buffer).unwrap(), Some(3));
        assert_eq!(&buffer, b"hel\0");

        let err = bridge.receive_text(pull, &mut []).unwrap_err();
        assert_eq!(err.status(), Status::ReceiveError);
    }

    #[test]
    fn test_pattern_misuse_maps_to_send_and_receive_errors() {
        let bridge = bridge();
        let publisher = bridge.create_publisher("inproc://misuse").unwrap();
        let subscriber = bridge.create_subscriber("inproc://misuse", "").unwrap();

        let err = bridge.send(subscriber, b"nope").unwrap_err();
        assert_eq!(err.status(), Status::SendError);

        let err = bridge.receive(publisher, &mut [0u8; 8]).unwrap_err();
        assert_eq!(err.status(), Status::ReceiveError);
        assert!(bridge.last_error().starts_with("Receive error"));
    }

    #[test]
    fn test_drop_shuts_down() {
        let remaining = {
            let bridge = bridge();
            bridge.create_pull("inproc://dropped").unwrap();
            assert_eq!(bridge.socket_count(), 1);
            bridge.shutdown();
            bridge.socket_count()
        };
        assert_eq!(remaining, 0);
    }
}
