//! Context lifecycle and handle bookkeeping through the bridge facade.

use msgbridge::{Bridge, BridgeConfig, BridgeError, Handle, Status};
use msgbridge_core::inproc::InprocTransport;

fn bridge() -> Bridge<InprocTransport> {
    let bridge = Bridge::new(BridgeConfig::default());
    bridge.initialize().unwrap();
    bridge
}

#[test]
fn test_every_operation_requires_a_context() {
    let bridge: Bridge<InprocTransport> = Bridge::new(BridgeConfig::default());
    assert!(!bridge.is_initialized());

    let handle = Handle::FIRST;
    let failures = [
        bridge.create_publisher("inproc://a").map(|_| ()),
        bridge.create_subscriber("inproc://a", "").map(|_| ()),
        bridge.create_request("inproc://a").map(|_| ()),
        bridge.create_reply("inproc://a").map(|_| ()),
        bridge.create_push("inproc://a").map(|_| ()),
        bridge.create_pull("inproc://a").map(|_| ()),
        bridge.send(handle, b"x"),
        bridge.publish(handle, "t", b"x"),
        bridge.receive(handle, &mut [0u8; 4]).map(|_| ()),
        bridge.poll(handle, std::time::Duration::ZERO).map(|_| ()),
    ];
    for result in failures {
        let err = result.unwrap_err();
        assert!(matches!(err, BridgeError::NotInitialized), "{err}");
        assert_eq!(err.status(), Status::InitError);
    }
    assert_eq!(bridge.last_error(), "Context not initialized");
}

#[test]
fn test_shutdown_invalidates_everything() {
    let bridge = bridge();
    let pull = bridge.create_pull("inproc://lifecycle").unwrap();
    let push = bridge.create_push("inproc://lifecycle").unwrap();
    assert_eq!(bridge.socket_count(), 2);

    bridge.shutdown();
    assert!(!bridge.is_initialized());
    assert_eq!(bridge.socket_count(), 0);

    assert_eq!(bridge.send(push, b"late").unwrap_err().status(), Status::InitError);
    assert_eq!(
        bridge.receive(pull, &mut [0u8; 4]).unwrap_err().status(),
        Status::InitError
    );
    assert!(!bridge.close(pull));

    // Shutting down twice is harmless
    bridge.shutdown();
}

#[test]
fn test_reinitialize_resets_handles() {
    let bridge = bridge();
    let first = bridge.create_pull("inproc://reset-a").unwrap();
    let second = bridge.create_pull("inproc://reset-b").unwrap();
    assert_eq!(first, Handle::FIRST);
    assert_eq!(second.as_raw(), 2);

    bridge.shutdown();
    bridge.initialize().unwrap();

    // Names from the old context are free again, and counting restarts
    let again = bridge.create_pull("inproc://reset-a").unwrap();
    assert_eq!(again, Handle::FIRST);
}

#[test]
fn test_handles_strictly_increase() {
    let bridge = bridge();
    let mut previous = None;
    for i in 0..20 {
        let handle = bridge.create_pull(&format!("inproc://monotonic-{i}")).unwrap();
        if let Some(prev) = previous {
            assert!(handle > prev);
        }
        if i % 3 == 0 {
            assert!(bridge.close(handle));
        }
        previous = Some(handle);
    }
}

#[test]
fn test_closed_handle_is_invalid() {
    let bridge = bridge();
    let pull = bridge.create_pull("inproc://closed").unwrap();

    assert!(bridge.close(pull));
    assert!(!bridge.close(pull), "second close reports not found");

    let err = bridge.receive(pull, &mut [0u8; 4]).unwrap_err();
    assert_eq!(err.status(), Status::InvalidSocket);
    assert_eq!(bridge.last_error(), format!("Invalid socket ID: {pull}"));

    let err = bridge.poll(pull, std::time::Duration::ZERO).unwrap_err();
    assert_eq!(err.status(), Status::InvalidSocket);
}

#[test]
fn test_never_issued_handles() {
    let bridge = bridge();
    for raw in [0, -1, 7, i32::MAX] {
        let err = bridge.send(Handle::from_raw(raw), b"x").unwrap_err();
        assert_eq!(err.status(), Status::InvalidSocket);
        assert!(!bridge.close(Handle::from_raw(raw)));
    }
}

#[test]
fn test_failed_creation_reports_and_issues_nothing() {
    let bridge = bridge();

    let err = bridge.create_push("inproc://nobody-home").unwrap_err();
    assert_eq!(err.status(), Status::ConnectError);
    assert!(bridge.last_error().contains("inproc://nobody-home"));

    bridge.create_pull("inproc://taken").unwrap();
    let err = bridge.create_pull("inproc://taken").unwrap_err();
    assert_eq!(err.status(), Status::BindError);

    let err = bridge.create_reply("carrier-pigeon://coop").unwrap_err();
    assert_eq!(err.status(), Status::BindError);

    assert_eq!(bridge.socket_count(), 1);
    let next = bridge.create_pull("inproc://after-failures").unwrap();
    assert_eq!(next.as_raw(), 2);
}

#[test]
fn test_instances_are_independent() {
    let a = bridge();
    let b = bridge();

    let ha = a.create_pull("inproc://shared-name").unwrap();
    let hb = b.create_pull("inproc://shared-name").unwrap();
    assert_eq!(ha, hb);

    a.shutdown();
    assert!(b.is_initialized());
    assert!(a.last_error().is_empty());
    assert!(b.validate(hb).is_ok());
}
