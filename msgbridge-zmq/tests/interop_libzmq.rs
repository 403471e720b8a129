//! The libzmq transport talking to plain libzmq sockets on the same context.

use bytes::Bytes;
use msgbridge_core::prelude::*;
use msgbridge_zmq::ZmqTransport;
use std::thread;
use std::time::Duration;

fn transport() -> ZmqTransport {
    ZmqTransport::open(&ContextConfig::default()).unwrap()
}

#[test]
fn test_publish_reaches_libzmq_subscriber() {
    let ctx = transport();
    let publisher = ctx.socket(Pattern::Pub, &SocketOptions::default()).unwrap();
    publisher.bind("inproc://interop-pub").unwrap();

    let sub = ctx.context().socket(zmq::SUB).unwrap();
    sub.set_subscribe(b"vehicle").unwrap();
    sub.connect("inproc://interop-pub").unwrap();

    // Subscriptions propagate asynchronously; keep publishing until one lands
    let mut received = None;
    for _ in 0..100 {
        publisher.send(b"vehicle", true).unwrap();
        publisher.send(b"speed=12", false).unwrap();
        if sub.poll(zmq::POLLIN, 20).unwrap() > 0 {
            received = Some(sub.recv_multipart(0).unwrap());
            break;
        }
    }

    let frames = received.expect("subscriber never received a message");
    assert_eq!(frames, vec![b"vehicle".to_vec(), b"speed=12".to_vec()]);
}

#[test]
fn test_request_reply_with_libzmq_server() {
    let ctx = transport();
    let rep = ctx.context().socket(zmq::REP).unwrap();
    rep.bind("inproc://interop-rep").unwrap();

    let server = thread::spawn(move || {
        let request = rep.recv_bytes(0).unwrap();
        assert_eq!(request, b"ping");
        rep.send(&b"pong"[..], 0).unwrap();
    });

    let req = ctx.socket(Pattern::Req, &SocketOptions::default()).unwrap();
    req.connect("inproc://interop-rep").unwrap();
    req.send(b"ping", false).unwrap();

    assert!(req.poll_readable(Duration::from_secs(5)).unwrap());
    assert_eq!(req.try_recv().unwrap(), Some(Bytes::from_static(b"pong")));
    server.join().unwrap();
}

#[test]
fn test_nonblocking_receive_and_zero_poll() {
    let ctx = transport();
    let pull = ctx.socket(Pattern::Pull, &SocketOptions::default()).unwrap();
    pull.bind("inproc://interop-pull").unwrap();

    assert!(!pull.poll_readable(Duration::ZERO).unwrap());
    assert_eq!(pull.try_recv().unwrap(), None);

    let push = ctx.context().socket(zmq::PUSH).unwrap();
    push.connect("inproc://interop-pull").unwrap();
    push.send(&b"job"[..], 0).unwrap();

    assert!(pull.poll_readable(Duration::from_secs(5)).unwrap());
    assert_eq!(pull.try_recv().unwrap(), Some(Bytes::from_static(b"job")));
}

#[test]
fn test_bad_address_is_reported() {
    let ctx = transport();
    let pull = ctx.socket(Pattern::Pull, &SocketOptions::default()).unwrap();
    let err = pull.bind("bogus://nowhere").unwrap_err();
    assert!(err.is_address_error(), "{err}");
}

#[test]
fn test_subscribe_rejected_on_publisher() {
    let ctx = transport();
    let publisher = ctx.socket(Pattern::Pub, &SocketOptions::default()).unwrap();
    assert!(matches!(
        publisher.subscribe(b"x"),
        Err(TransportError::Unsupported { .. })
    ));
}
