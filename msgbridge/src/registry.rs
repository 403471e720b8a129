//! Endpoint registry.
//!
//! Owns the transport context and the table mapping handles to live
//! endpoints. One lock guards the table; it is held only long enough to
//! insert, look up, or remove an entry, never across a transport call.
//!
//! Lookups hand out an `Arc` to the endpoint. Closing a handle removes the
//! table entry at once, and the endpoint itself is released when the last
//! in-flight operation holding that `Arc` returns, so a concurrent close can
//! never leave a caller on a freed endpoint.

use hashbrown::HashMap;
use msgbridge_core::options::SocketOptions;
use msgbridge_core::pattern::{Direction, Pattern};
use msgbridge_core::transport::{Transport, TransportSocket};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{BridgeError, Result};
use crate::handle::Handle;

#[derive(Debug)]
struct HandleTable<S> {
    sockets: HashMap<Handle, Arc<S>>,
    next_handle: Option<Handle>,
}

/// Handle table plus the transport context it was opened against.
pub struct Registry<T: Transport> {
    // Declared before `context` so endpoints drop before the context
    table: Mutex<HandleTable<T::Socket>>,
    context: T,
}

/// What to create.
#[derive(Debug, Clone, Copy)]
pub struct SocketSpec<'a> {
    /// Messaging pattern of the new endpoint
    pub pattern: Pattern,
    /// Address to bind or connect
    pub endpoint: &'a str,
    /// Whether `endpoint` is a local or remote address
    pub direction: Direction,
    /// Topic filter; only applied to SUB endpoints, empty = everything
    pub topic: Option<&'a [u8]>,
}

impl<'a> SocketSpec<'a> {
    /// Spec for `pattern` with its natural bind/connect direction.
    #[must_use]
    pub fn new(pattern: Pattern, endpoint: &'a str) -> Self {
        Self {
            pattern,
            endpoint,
            direction: pattern.direction(),
            topic: None,
        }
    }

    /// Set the subscription filter.
    #[must_use]
    pub const fn with_topic(mut self, topic: &'a [u8]) -> Self {
        self.topic = Some(topic);
        self
    }
}

impl<T: Transport> Registry<T> {
    /// Wrap a freshly opened context. The first handle issued is 1.
    pub fn new(context: T) -> Self {
        Self {
            table: Mutex::new(HandleTable {
                sockets: HashMap::new(),
                next_handle: Some(Handle::FIRST),
            }),
            context,
        }
    }

    /// The transport context.
    pub fn context(&self) -> &T {
        &self.context
    }

    /// Create, configure, and bind or connect an endpoint, then issue a
    /// handle for it.
    ///
    /// Options (zero linger included) and the SUB topic filter are applied
    /// before bind/connect, so a subscriber misses nothing to ordering. On
    /// any failure no handle is issued and the table is unchanged.
    pub fn create(&self, spec: SocketSpec<'_>, options: &SocketOptions) -> Result<Handle> {
        let SocketSpec {
            pattern,
            endpoint,
            direction,
            topic,
        } = spec;

        let socket = self
            .context
            .socket(pattern, options)
            .map_err(|source| BridgeError::Socket { pattern, source })?;

        if pattern == Pattern::Sub {
            socket
                .subscribe(topic.unwrap_or_default())
                .map_err(|source| BridgeError::Socket { pattern, source })?;
        }

        match direction {
            Direction::Bind => socket.bind(endpoint).map_err(|source| BridgeError::Bind {
                pattern,
                endpoint: endpoint.to_string(),
                source,
            })?,
            Direction::Connect => {
                socket
                    .connect(endpoint)
                    .map_err(|source| BridgeError::Connect {
                        pattern,
                        endpoint: endpoint.to_string(),
                        source,
                    })?;
            }
        }

        let mut table = self.table.lock();
        let handle = table.next_handle.ok_or(BridgeError::HandlesExhausted)?;
        table.next_handle = handle.next();
        table.sockets.insert(handle, Arc::new(socket));
        drop(table);

        debug!("[BRIDGE] {} socket {} on {}", pattern, handle, endpoint);
        Ok(handle)
    }

    /// Resolve a handle to its live endpoint.
    pub fn lookup(&self, handle: Handle) -> Result<Arc<T::Socket>> {
        if !handle.is_valid() {
            return Err(BridgeError::InvalidSocket(handle));
        }
        self.table
            .lock()
            .sockets
            .get(&handle)
            .cloned()
            .ok_or(BridgeError::InvalidSocket(handle))
    }

    /// Remove and destroy an endpoint. Returns whether it was present;
    /// closing an unknown handle is a no-op.
    pub fn close(&self, handle: Handle) -> bool {
        let removed = self.table.lock().sockets.remove(&handle);
        match removed {
            Some(socket) => {
                trace!("[BRIDGE] Closing {} socket {}", socket.pattern(), handle);
                true
            }
            None => {
                trace!("[BRIDGE] Close of unknown socket {} ignored", handle);
                false
            }
        }
    }

    /// Remove and destroy every endpoint. Returns how many were live.
    pub fn close_all(&self) -> usize {
        let drained: Vec<Arc<T::Socket>> = {
            let mut table = self.table.lock();
            table.sockets.drain().map(|(_, socket)| socket).collect()
        };
        let count = drained.len();
        drop(drained);
        debug!("[BRIDGE] Closed {} sockets", count);
        count
    }

    /// Number of live endpoints.
    pub fn len(&self) -> usize {
        self.table.lock().sockets.len()
    }

    /// Whether no endpoint is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live handles, in ascending order.
    pub fn handles(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = self.table.lock().sockets.keys().copied().collect();
        handles.sort_unstable();
        handles
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("context", &self.context)
            .field("sockets", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgbridge_core::inproc::InprocTransport;

    fn registry() -> Registry<InprocTransport> {
        Registry::new(InprocTransport::new())
    }

    #[test]
    fn test_handles_are_monotonic() {
        let registry = registry();
        let opts = SocketOptions::default();

        let a = registry
            .create(SocketSpec::new(Pattern::Pull, "inproc://a"), &opts)
            .unwrap();
        let b = registry
            .create(SocketSpec::new(Pattern::Pub, "inproc://b"), &opts)
            .unwrap();
        assert_eq!(a, Handle::FIRST);
        assert!(b > a);

        assert!(registry.close(b));
        let c = registry
            .create(SocketSpec::new(Pattern::Rep, "inproc://c"), &opts)
            .unwrap();
        assert!(c > b, "closed handles are never reused");
        assert_eq!(registry.handles(), vec![a, c]);
    }

    #[test]
    fn test_failed_create_issues_nothing() {
        let registry = registry();
        let opts = SocketOptions::default();

        let err = registry
            .create(SocketSpec::new(Pattern::Push, "inproc://missing"), &opts)
            .unwrap_err();
        assert!(matches!(err, BridgeError::Connect { .. }));
        assert!(registry.is_empty());

        let first = registry
            .create(SocketSpec::new(Pattern::Pull, "inproc://missing"), &opts)
            .unwrap();
        assert_eq!(first, Handle::FIRST);
    }

    #[test]
    fn test_lookup_and_close() {
        let registry = registry();
        let handle = registry
            .create(
                SocketSpec::new(Pattern::Pull, "inproc://lookup"),
                &SocketOptions::default(),
            )
            .unwrap();

        assert_eq!(registry.lookup(handle).unwrap().pattern(), Pattern::Pull);
        assert!(matches!(
            registry.lookup(Handle::from_raw(0)),
            Err(BridgeError::InvalidSocket(_))
        ));

        assert!(registry.close(handle));
        assert!(!registry.close(handle));
        assert!(matches!(
            registry.lookup(handle),
            Err(BridgeError::InvalidSocket(_))
        ));
    }

    #[test]
    fn test_close_keeps_inflight_endpoint_alive() {
        let registry = registry();
        let handle = registry
            .create(
                SocketSpec::new(Pattern::Pull, "inproc://inflight"),
                &SocketOptions::default(),
            )
            .unwrap();

        let in_flight = registry.lookup(handle).unwrap();
        assert!(registry.close(handle));
        assert!(in_flight.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_close_all() {
        let registry = registry();
        let opts = SocketOptions::default();
        for name in ["inproc://x", "inproc://y", "inproc://z"] {
            registry
                .create(SocketSpec::new(Pattern::Pull, name), &opts)
                .unwrap();
        }

        assert_eq!(registry.close_all(), 3);
        assert!(registry.is_empty());
        assert!(registry.context().list_endpoints().is_empty());
    }
}
