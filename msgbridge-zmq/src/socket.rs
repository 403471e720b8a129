//! libzmq endpoint and context wrappers.
//!
//! libzmq sockets must not be used from two threads at once, so each
//! [`ZmqSocket`] keeps its `zmq::Socket` behind a mutex. Concurrent calls on
//! the same endpoint therefore run one after another; a `poll_readable`
//! with a long timeout delays other calls on that endpoint (never on others).

use bytes::Bytes;
use msgbridge_core::error::{Result, TransportError};
use msgbridge_core::options::SocketOptions;
use msgbridge_core::pattern::Pattern;
use msgbridge_core::transport::{ContextConfig, Transport, TransportSocket};
use parking_lot::Mutex;
use std::io;
use std::time::Duration;
use tracing::{debug, trace};

/// Map a pattern onto the libzmq socket type.
pub fn zmq_socket_type(pattern: Pattern) -> zmq::SocketType {
    match pattern {
        Pattern::Pub => zmq::PUB,
        Pattern::Sub => zmq::SUB,
        Pattern::Req => zmq::REQ,
        Pattern::Rep => zmq::REP,
        Pattern::Pull => zmq::PULL,
        Pattern::Push => zmq::PUSH,
    }
}

/// Convert a libzmq error into a transport error, keeping address problems
/// recognizable as I/O errors of the matching kind.
pub(crate) fn map_zmq_error(err: zmq::Error) -> TransportError {
    let kind = match err {
        zmq::Error::EADDRINUSE => io::ErrorKind::AddrInUse,
        zmq::Error::EADDRNOTAVAIL => io::ErrorKind::AddrNotAvailable,
        zmq::Error::ECONNREFUSED => io::ErrorKind::ConnectionRefused,
        zmq::Error::ENOENT | zmq::Error::ENODEV => io::ErrorKind::NotFound,
        zmq::Error::EINVAL | zmq::Error::EPROTONOSUPPORT => io::ErrorKind::InvalidInput,
        zmq::Error::EAGAIN => io::ErrorKind::WouldBlock,
        zmq::Error::EINTR => io::ErrorKind::Interrupted,
        zmq::Error::EFSM => {
            return TransportError::invalid_state(err.message());
        }
        zmq::Error::ENOTSUP => return TransportError::backend(err.message()),
        _ => return TransportError::backend(format!("{} (errno {})", err.message(), err.to_raw())),
    };
    io::Error::new(kind, err.message()).into()
}

fn hwm(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// A libzmq context.
pub struct ZmqTransport {
    ctx: zmq::Context,
}

impl ZmqTransport {
    /// The underlying libzmq context.
    pub fn context(&self) -> &zmq::Context {
        &self.ctx
    }
}

impl std::fmt::Debug for ZmqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqTransport").finish_non_exhaustive()
    }
}

impl Transport for ZmqTransport {
    type Socket = ZmqSocket;

    fn name(&self) -> &'static str {
        "zmq"
    }

    fn open(config: &ContextConfig) -> Result<Self> {
        let ctx = zmq::Context::new();
        ctx.set_io_threads(config.io_threads.max(1))
            .map_err(map_zmq_error)?;
        let (major, minor, patch) = zmq::version();
        debug!(
            "[ZMQ] Context opened (libzmq {}.{}.{}, {} io threads)",
            major, minor, patch, config.io_threads
        );
        Ok(Self { ctx })
    }

    fn socket(&self, pattern: Pattern, options: &SocketOptions) -> Result<ZmqSocket> {
        let socket = self
            .ctx
            .socket(zmq_socket_type(pattern))
            .map_err(map_zmq_error)?;
        socket
            .set_linger(options.linger_millis())
            .map_err(map_zmq_error)?;
        socket
            .set_sndhwm(hwm(options.send_hwm))
            .map_err(map_zmq_error)?;
        socket
            .set_rcvhwm(hwm(options.recv_hwm))
            .map_err(map_zmq_error)?;

        trace!("[ZMQ] Created {} socket", pattern);
        Ok(ZmqSocket {
            pattern,
            socket: Mutex::new(socket),
        })
    }
}

/// A libzmq endpoint.
pub struct ZmqSocket {
    pattern: Pattern,
    socket: Mutex<zmq::Socket>,
}

impl std::fmt::Debug for ZmqSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqSocket")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl TransportSocket for ZmqSocket {
    fn pattern(&self) -> Pattern {
        self.pattern
    }

    fn subscribe(&self, prefix: &[u8]) -> Result<()> {
        if self.pattern != Pattern::Sub {
            return Err(TransportError::unsupported(self.pattern, "subscribe"));
        }
        trace!("[ZMQ] Adding subscription: {:?}", prefix);
        self.socket.lock().set_subscribe(prefix).map_err(map_zmq_error)
    }

    fn bind(&self, endpoint: &str) -> Result<()> {
        self.socket.lock().bind(endpoint).map_err(map_zmq_error)?;
        debug!("[ZMQ] {} bound to {}", self.pattern, endpoint);
        Ok(())
    }

    fn connect(&self, endpoint: &str) -> Result<()> {
        self.socket.lock().connect(endpoint).map_err(map_zmq_error)?;
        debug!("[ZMQ] {} connected to {}", self.pattern, endpoint);
        Ok(())
    }

    fn send(&self, frame: &[u8], more: bool) -> Result<()> {
        let flags = if more { zmq::SNDMORE } else { 0 };
        self.socket.lock().send(frame, flags).map_err(map_zmq_error)
    }

    fn try_recv(&self) -> Result<Option<Bytes>> {
        match self.socket.lock().recv_bytes(zmq::DONTWAIT) {
            Ok(frame) => Ok(Some(Bytes::from(frame))),
            Err(zmq::Error::EAGAIN) => Ok(None),
            Err(err) => Err(map_zmq_error(err)),
        }
    }

    fn poll_readable(&self, timeout: Duration) -> Result<bool> {
        let timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
        let ready = self
            .socket
            .lock()
            .poll(zmq::POLLIN, timeout_ms)
            .map_err(map_zmq_error)?;
        Ok(ready > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_type_mapping() {
        assert_eq!(zmq_socket_type(Pattern::Pub), zmq::PUB);
        assert_eq!(zmq_socket_type(Pattern::Sub), zmq::SUB);
        assert_eq!(zmq_socket_type(Pattern::Req), zmq::REQ);
        assert_eq!(zmq_socket_type(Pattern::Rep), zmq::REP);
        assert_eq!(zmq_socket_type(Pattern::Pull), zmq::PULL);
        assert_eq!(zmq_socket_type(Pattern::Push), zmq::PUSH);
    }

    #[test]
    fn test_error_mapping() {
        assert!(map_zmq_error(zmq::Error::EADDRINUSE).is_address_error());
        assert!(map_zmq_error(zmq::Error::ECONNREFUSED).is_address_error());
        assert!(matches!(
            map_zmq_error(zmq::Error::EFSM),
            TransportError::InvalidState(_)
        ));
        assert!(matches!(
            map_zmq_error(zmq::Error::EAGAIN),
            TransportError::Io(e) if e.kind() == io::ErrorKind::WouldBlock
        ));
    }

    #[test]
    fn test_hwm_saturates() {
        assert_eq!(hwm(1000), 1000);
        assert_eq!(hwm(usize::MAX), i32::MAX);
    }
}
