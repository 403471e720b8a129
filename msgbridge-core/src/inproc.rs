//! In-process transport.
//!
//! Implements the transport capability traits with channels, for endpoints
//! living in the same process. It serves `inproc://name` addresses only.
//!
//! # Features
//!
//! - **Context-scoped**: bound names live in the [`InprocTransport`] they were
//!   bound in, so independent contexts never see each other's endpoints
//! - **Atomic multipart**: frames sent with `more = true` are staged and the
//!   whole message is delivered at once on the final frame
//! - **Frame-at-a-time receive**: each `try_recv` dequeues one frame
//! - **Zero-copy fan-out**: PUB shares `Bytes` frames between subscribers
//!
//! # Pattern semantics
//!
//! | Pattern | Direction | Behaviour |
//! |---|---|---|
//! | PUB | bind | fan-out to SUB inboxes whose filter matches frame 1; drops at hwm |
//! | SUB | connect | receives matching messages |
//! | PUSH | connect | round-robin to bound PULLs; blocks at hwm |
//! | PULL | bind | receives from PUSHes |
//! | REQ | connect | send, then receive exactly one reply |
//! | REP | bind | receive a request, then send exactly one reply |
//!
//! Connect requires an existing bind of a compatible pattern.
//!
//! # Usage
//!
//! ```rust
//! use msgbridge_core::inproc::InprocTransport;
//! use msgbridge_core::options::SocketOptions;
//! use msgbridge_core::pattern::Pattern;
//! use msgbridge_core::transport::{ContextConfig, Transport, TransportSocket};
//!
//! # fn example() -> msgbridge_core::error::Result<()> {
//! let ctx = InprocTransport::open(&ContextConfig::default())?;
//! let opts = SocketOptions::default();
//!
//! let pull = ctx.socket(Pattern::Pull, &opts)?;
//! pull.bind("inproc://work")?;
//!
//! let push = ctx.socket(Pattern::Push, &opts)?;
//! push.connect("inproc://work")?;
//!
//! push.send(b"job-1", false)?;
//! assert_eq!(pull.try_recv()?.as_deref(), Some(&b"job-1"[..]));
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::endpoint::{Endpoint, EndpointError};
use crate::error::{Result, TransportError};
use crate::options::SocketOptions;
use crate::pattern::{Direction, Pattern};
use crate::subscription::SubscriptionSet;
use crate::transport::{ContextConfig, Transport, TransportSocket};

/// Message type for inproc transport (multipart message)
pub type InprocMessage = SmallVec<[Bytes; 2]>;

/// A message in flight, with the route back to a REQ when it is a request.
#[derive(Debug, Clone)]
struct Envelope {
    frames: InprocMessage,
    reply_to: Option<Sender<Envelope>>,
}

/// PUB side of a fan-out: every connected subscriber's inbox and filter.
#[derive(Debug, Default)]
struct FanoutHub {
    subscribers: Mutex<Vec<SubscriberLink>>,
}

#[derive(Debug)]
struct SubscriberLink {
    filter: Arc<RwLock<SubscriptionSet>>,
    tx: Sender<Envelope>,
}

impl FanoutHub {
    /// Deliver to every matching subscriber. Never blocks: a full inbox
    /// loses the message, a closed one is unlinked.
    fn publish(&self, frames: InprocMessage) {
        let topic = frames.first().cloned().unwrap_or_default();
        let envelope = Envelope {
            frames,
            reply_to: None,
        };

        self.subscribers.lock().retain(|link| {
            if link.tx.is_disconnected() {
                trace!("[INPROC] Subscriber gone, unlinking");
                return false;
            }
            if !link.filter.read().matches(&topic) {
                return true;
            }
            match link.tx.try_send(envelope.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    trace!("[INPROC] Subscriber at high water mark, message dropped");
                    true
                }
                Err(TrySendError::Disconnected(_)) => {
                    trace!("[INPROC] Subscriber gone, unlinking");
                    false
                }
            }
        });
    }
}

/// What a bound name resolves to.
#[derive(Debug, Clone)]
enum Binding {
    /// A PUB endpoint
    Hub(Arc<FanoutHub>),
    /// A PULL or REP endpoint's inbox
    Inbox { pattern: Pattern, tx: Sender<Envelope> },
}

impl Binding {
    fn pattern(&self) -> Pattern {
        match self {
            Self::Hub(_) => Pattern::Pub,
            Self::Inbox { pattern, .. } => *pattern,
        }
    }
}

type BindingTable = Arc<DashMap<String, Binding>>;

/// In-process transport context.
///
/// Owns the table of bound names. Dropping the context while endpoints are
/// still alive is fine: each endpoint keeps the table alive until it closes.
#[derive(Debug, Default)]
pub struct InprocTransport {
    bindings: BindingTable,
}

impl InprocTransport {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// List all currently bound endpoint names (without the `inproc://`
    /// prefix). Primarily useful for debugging and testing.
    pub fn list_endpoints(&self) -> Vec<String> {
        self.bindings
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl Transport for InprocTransport {
    type Socket = InprocSocket;

    fn name(&self) -> &'static str {
        "inproc"
    }

    fn open(_config: &ContextConfig) -> Result<Self> {
        debug!("[INPROC] Opening context");
        Ok(Self::new())
    }

    fn socket(&self, pattern: Pattern, options: &SocketOptions) -> Result<InprocSocket> {
        let (inbox_tx, inbox_rx) = flume::bounded(options.recv_hwm.max(1));
        trace!("[INPROC] Creating {} socket", pattern);

        Ok(InprocSocket {
            pattern,
            options: options.clone(),
            bindings: Arc::clone(&self.bindings),
            inbox_tx,
            inbox_rx,
            filter: Arc::new(RwLock::new(SubscriptionSet::new())),
            hub: Arc::new(FanoutHub::default()),
            state: Mutex::new(SocketState::default()),
        })
    }
}

#[derive(Debug, Default)]
struct SocketState {
    /// Names this socket bound; released on drop
    bound: Vec<String>,
    /// PUSH / REQ peers, served round-robin
    peers: Vec<Sender<Envelope>>,
    next_peer: usize,
    /// Outgoing frames of a message not yet finished
    staged: InprocMessage,
    /// Remaining frames of the message currently being read
    inbound: VecDeque<Bytes>,
    /// Messages taken off the inbox by `poll_readable`, not yet read
    stash: VecDeque<Envelope>,
    /// REP: route back to the requester it owes a reply
    reply_to: Option<Sender<Envelope>>,
    /// REQ: a request went out and its reply is not fully read yet
    awaiting_reply: bool,
}

impl SocketState {
    fn next_peer(&mut self) -> Option<Sender<Envelope>> {
        if self.peers.is_empty() {
            return None;
        }
        let peer = self.peers[self.next_peer % self.peers.len()].clone();
        self.next_peer = self.next_peer.wrapping_add(1);
        Some(peer)
    }

    /// Whether the REQ/REP state machine allows starting on the next
    /// queued message.
    fn may_take_next(&self, pattern: Pattern) -> bool {
        match pattern {
            Pattern::Req => self.awaiting_reply,
            Pattern::Rep => self.reply_to.is_none(),
            _ => true,
        }
    }

    fn pop_frame(&mut self, pattern: Pattern) -> Option<Bytes> {
        let frame = self.inbound.pop_front()?;
        if pattern == Pattern::Req && self.inbound.is_empty() {
            self.awaiting_reply = false;
        }
        Some(frame)
    }
}

/// An in-process endpoint.
#[derive(Debug)]
pub struct InprocSocket {
    pattern: Pattern,
    options: SocketOptions,
    bindings: BindingTable,
    inbox_tx: Sender<Envelope>,
    inbox_rx: Receiver<Envelope>,
    filter: Arc<RwLock<SubscriptionSet>>,
    hub: Arc<FanoutHub>,
    state: Mutex<SocketState>,
}

impl InprocSocket {
    /// Options this socket was created with.
    pub fn options(&self) -> &SocketOptions {
        &self.options
    }

    fn inproc_name(endpoint: &str) -> Result<String> {
        match Endpoint::parse(endpoint)? {
            Endpoint::Inproc(name) => Ok(name),
            other => Err(EndpointError::UnsupportedTransport {
                scheme: other.scheme(),
                transport: "inproc",
            }
            .into()),
        }
    }

    fn check_direction(&self, direction: Direction, op: &'static str) -> Result<()> {
        if self.pattern.direction() == direction {
            Ok(())
        } else {
            Err(TransportError::unsupported(self.pattern, op))
        }
    }

    fn deliver(&self, frames: InprocMessage) -> Result<()> {
        match self.pattern {
            Pattern::Pub => {
                self.hub.publish(frames);
                Ok(())
            }
            Pattern::Push => {
                let peer = self
                    .state
                    .lock()
                    .next_peer()
                    .ok_or_else(|| TransportError::invalid_state("PUSH socket has no peers"))?;
                // Blocks at the peer's high water mark, outside the state lock
                peer.send(Envelope {
                    frames,
                    reply_to: None,
                })
                .map_err(|_| peer_gone())
            }
            Pattern::Req => {
                let peer = self
                    .state
                    .lock()
                    .next_peer()
                    .ok_or_else(|| TransportError::invalid_state("REQ socket has no peers"))?;
                peer.send(Envelope {
                    frames,
                    reply_to: Some(self.inbox_tx.clone()),
                })
                .map_err(|_| peer_gone())?;
                self.state.lock().awaiting_reply = true;
                Ok(())
            }
            Pattern::Rep => {
                let requester = self.state.lock().reply_to.take();
                if let Some(requester) = requester {
                    // A requester that went away simply never sees its reply
                    if requester
                        .try_send(Envelope {
                            frames,
                            reply_to: None,
                        })
                        .is_err()
                    {
                        trace!("[INPROC] Requester gone, reply dropped");
                    }
                }
                Ok(())
            }
            Pattern::Sub | Pattern::Pull => Err(TransportError::unsupported(self.pattern, "send")),
        }
    }
}

fn peer_gone() -> TransportError {
    io::Error::new(io::ErrorKind::BrokenPipe, "inproc peer closed").into()
}

impl TransportSocket for InprocSocket {
    fn pattern(&self) -> Pattern {
        self.pattern
    }

    fn subscribe(&self, prefix: &[u8]) -> Result<()> {
        if self.pattern != Pattern::Sub {
            return Err(TransportError::unsupported(self.pattern, "subscribe"));
        }
        trace!("[INPROC] Adding subscription: {:?}", prefix);
        self.filter.write().subscribe(prefix);
        Ok(())
    }

    fn bind(&self, endpoint: &str) -> Result<()> {
        self.check_direction(Direction::Bind, "bind")?;
        let name = Self::inproc_name(endpoint)?;

        let binding = match self.pattern {
            Pattern::Pub => Binding::Hub(Arc::clone(&self.hub)),
            pattern => Binding::Inbox {
                pattern,
                tx: self.inbox_tx.clone(),
            },
        };

        match self.bindings.entry(name.clone()) {
            Entry::Occupied(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AddrInUse,
                    format!("inproc endpoint '{name}' is already bound"),
                )
                .into());
            }
            Entry::Vacant(slot) => {
                slot.insert(binding);
            }
        }

        debug!("[INPROC] {} bound to inproc://{}", self.pattern, name);
        self.state.lock().bound.push(name);
        Ok(())
    }

    fn connect(&self, endpoint: &str) -> Result<()> {
        self.check_direction(Direction::Connect, "connect")?;
        let name = Self::inproc_name(endpoint)?;

        // Clone out of the table so no shard lock is held below
        let binding = self
            .bindings
            .get(&name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("inproc endpoint '{name}' not found (must bind before connect)"),
                )
            })?;

        let peer = binding.pattern();
        if !self.pattern.is_compatible(peer) {
            return Err(TransportError::Incompatible {
                local: self.pattern,
                peer,
            });
        }

        match binding {
            Binding::Hub(hub) => hub.subscribers.lock().push(SubscriberLink {
                filter: Arc::clone(&self.filter),
                tx: self.inbox_tx.clone(),
            }),
            Binding::Inbox { tx, .. } => self.state.lock().peers.push(tx),
        }

        debug!("[INPROC] {} connected to inproc://{}", self.pattern, name);
        Ok(())
    }

    fn send(&self, frame: &[u8], more: bool) -> Result<()> {
        if !self.pattern.can_send() {
            return Err(TransportError::unsupported(self.pattern, "send"));
        }

        let frames = {
            let mut state = self.state.lock();
            if state.staged.is_empty() {
                match self.pattern {
                    Pattern::Req if state.awaiting_reply => {
                        return Err(TransportError::invalid_state(
                            "REQ must receive a reply before sending again",
                        ));
                    }
                    Pattern::Rep if state.reply_to.is_none() => {
                        return Err(TransportError::invalid_state(
                            "REP must receive a request before replying",
                        ));
                    }
                    _ => {}
                }
            }

            state.staged.push(Bytes::copy_from_slice(frame));
            if more {
                return Ok(());
            }
            std::mem::take(&mut state.staged)
        };

        trace!("[INPROC] {} sending {} frames", self.pattern, frames.len());
        self.deliver(frames)
    }

    fn try_recv(&self) -> Result<Option<Bytes>> {
        if !self.pattern.can_recv() {
            return Err(TransportError::unsupported(self.pattern, "receive"));
        }

        let mut state = self.state.lock();
        if let Some(frame) = state.pop_frame(self.pattern) {
            return Ok(Some(frame));
        }

        if !state.may_take_next(self.pattern) {
            let reason = if self.pattern == Pattern::Req {
                "REQ must send a request before receiving"
            } else {
                "REP must reply before receiving the next request"
            };
            return Err(TransportError::invalid_state(reason));
        }

        let envelope = match state.stash.pop_front() {
            Some(envelope) => envelope,
            None => match self.inbox_rx.try_recv() {
                Ok(envelope) => envelope,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Ok(None),
            },
        };

        trace!("[INPROC] {} received {} frames", self.pattern, envelope.frames.len());
        if self.pattern == Pattern::Rep {
            state.reply_to = envelope.reply_to;
        }
        state.inbound.extend(envelope.frames);
        Ok(state.pop_frame(self.pattern))
    }

    fn poll_readable(&self, timeout: Duration) -> Result<bool> {
        if !self.pattern.can_recv() {
            return Ok(false);
        }

        {
            let state = self.state.lock();
            if !state.inbound.is_empty() {
                return Ok(true);
            }
            // A queued message that try_recv would refuse is not readable
            if !state.may_take_next(self.pattern) {
                return Ok(false);
            }
            if !state.stash.is_empty() {
                return Ok(true);
            }
        }

        if timeout.is_zero() {
            return Ok(!self.inbox_rx.is_empty());
        }

        // Wait without holding the state lock so sends on this socket proceed
        let received = match Instant::now().checked_add(timeout) {
            Some(deadline) => self.inbox_rx.recv_deadline(deadline),
            None => self
                .inbox_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(envelope) => {
                self.state.lock().stash.push_back(envelope);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Ok(false),
        }
    }
}

impl Drop for InprocSocket {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.staged.is_empty() {
            trace!(
                "[INPROC] Discarding {} unsent frames on close",
                state.staged.len()
            );
        }
        for name in state.bound.drain(..) {
            self.bindings.remove(&name);
            debug!("[INPROC] Unbound inproc://{}", name);
        }
    }
}
