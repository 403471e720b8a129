//! # msgbridge ZMQ
//!
//! libzmq-backed implementation of the msgbridge transport capability traits.
//!
//! ## Overview
//!
//! [`ZmqTransport`] wraps a `zmq::Context`; [`ZmqSocket`] wraps one
//! `zmq::Socket` and serves all six bridge patterns over every address
//! scheme libzmq supports (`tcp://`, `ipc://`, `inproc://`).
//!
//! | Capability | libzmq call |
//! |---|---|
//! | create endpoint | `zmq_socket` + `ZMQ_LINGER` / `ZMQ_SNDHWM` / `ZMQ_RCVHWM` |
//! | topic filter | `ZMQ_SUBSCRIBE` |
//! | send frame | `zmq_send` with `ZMQ_SNDMORE` when more frames follow |
//! | receive frame | `zmq_recv` with `ZMQ_DONTWAIT`, `EAGAIN` = nothing queued |
//! | readiness | `zmq_poll` on `ZMQ_POLLIN` |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use msgbridge_core::prelude::*;
//! use msgbridge_zmq::ZmqTransport;
//!
//! # fn main() -> msgbridge_core::error::Result<()> {
//! let ctx = ZmqTransport::open(&ContextConfig::default())?;
//! let publisher = ctx.socket(Pattern::Pub, &SocketOptions::default())?;
//! publisher.bind("tcp://*:5555")?;
//!
//! publisher.send(b"vehicle", true)?;
//! publisher.send(b"{\"speed\": 12.5}", false)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod socket;

pub use socket::{zmq_socket_type, ZmqSocket, ZmqTransport};
