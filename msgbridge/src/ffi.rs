//! C ABI.
//!
//! One process-wide [`Bridge`] backs every `msgbridge_*` symbol; see
//! `include/msgbridge.h` for the host-side declarations. All functions are
//! callable from any thread. Status codes are the [`Status`] values; creation
//! functions return a positive handle or a negative status.
//!
//! Argument problems (null pointers, negative sizes, strings that are not
//! UTF-8) are reported through the same status and last-error channel as
//! transport failures, after the context and handle checks.
//!
//! The transport is fixed at build time by [`DefaultTransport`]. Without the
//! `zmq` feature that is the in-process transport, so the exported library
//! serves `inproc://` endpoints only and rejects `tcp://` and `ipc://` at
//! creation with a bind or connect error.

#![allow(unsafe_code)]

use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::slice;
use std::time::Duration;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::handle::Handle;
use crate::status::Status;
use msgbridge_core::pattern::Pattern;

/// Transport behind the C ABI.
#[cfg(feature = "zmq")]
pub type DefaultTransport = msgbridge_zmq::ZmqTransport;

/// Transport behind the C ABI.
#[cfg(not(feature = "zmq"))]
pub type DefaultTransport = msgbridge_core::inproc::InprocTransport;

static BRIDGE: Lazy<Bridge<DefaultTransport>> =
    Lazy::new(|| Bridge::new(BridgeConfig::from_env()));

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

/// The bridge instance behind the C ABI.
pub fn global() -> &'static Bridge<DefaultTransport> {
    &BRIDGE
}

fn status_of(result: Result<()>) -> c_int {
    match result {
        Ok(()) => Status::Ok.code(),
        Err(err) => err.status().code(),
    }
}

fn reject(status: Status, reason: &str) -> c_int {
    BRIDGE
        .report_error(BridgeError::invalid_argument(status, reason))
        .code()
}

/// Borrow a NUL-terminated string. `None` for null or non UTF-8 input.
unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null; the caller guarantees a NUL-terminated string that
    // outlives the call.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Borrow `size` bytes at `data`. A zero size never dereferences `data`.
unsafe fn borrow_bytes<'a>(data: *const c_void, size: c_int) -> Option<&'a [u8]> {
    let len = usize::try_from(size).ok()?;
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        return None;
    }
    // SAFETY: non-null; the caller guarantees `size` readable bytes.
    Some(unsafe { slice::from_raw_parts(data.cast::<u8>(), len) })
}

/// Mutable counterpart of [`borrow_bytes`].
unsafe fn borrow_buffer<'a>(buffer: *mut c_void, size: c_int) -> Option<&'a mut [u8]> {
    let len = usize::try_from(size).ok()?;
    if len == 0 {
        return Some(&mut []);
    }
    if buffer.is_null() {
        return None;
    }
    // SAFETY: non-null; the caller guarantees `size` writable bytes that no
    // one else touches during the call.
    Some(unsafe { slice::from_raw_parts_mut(buffer.cast::<u8>(), len) })
}

unsafe fn create(pattern: Pattern, endpoint: *const c_char, topic: Option<*const c_char>) -> c_int {
    if let Err(err) = BRIDGE.ensure_initialized() {
        return err.status().code();
    }
    let Some(endpoint) = (unsafe { borrow_str(endpoint) }) else {
        return reject(Status::SocketError, "endpoint must be a UTF-8 C string");
    };
    // A null topic subscribes to everything
    let topic = match topic {
        Some(ptr) if ptr.is_null() => Some(""),
        Some(ptr) => match unsafe { borrow_str(ptr) } {
            Some(topic) => Some(topic),
            None => return reject(Status::SocketError, "topic must be a UTF-8 C string"),
        },
        None => None,
    };

    match BRIDGE.create(pattern, endpoint, topic) {
        Ok(handle) => handle.as_raw(),
        Err(err) => err.status().code(),
    }
}

/// Open the context. Idempotent.
#[no_mangle]
pub extern "C" fn msgbridge_init() -> c_int {
    crate::dev_tracing::init_tracing();
    status_of(BRIDGE.initialize())
}

/// Close every socket and release the context. Safe to call repeatedly.
#[no_mangle]
pub extern "C" fn msgbridge_shutdown() {
    BRIDGE.shutdown();
}

/// Bind a PUB socket.
///
/// # Safety
///
/// `endpoint` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_create_publisher(endpoint: *const c_char) -> c_int {
    unsafe { create(Pattern::Pub, endpoint, None) }
}

/// Connect a SUB socket filtered on `topic` (null or empty = every topic).
///
/// # Safety
///
/// `endpoint` and `topic` must each be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_create_subscriber(
    endpoint: *const c_char,
    topic: *const c_char,
) -> c_int {
    unsafe { create(Pattern::Sub, endpoint, Some(topic)) }
}

/// Connect a REQ socket.
///
/// # Safety
///
/// `endpoint` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_create_request(endpoint: *const c_char) -> c_int {
    unsafe { create(Pattern::Req, endpoint, None) }
}

/// Bind a REP socket.
///
/// # Safety
///
/// `endpoint` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_create_reply(endpoint: *const c_char) -> c_int {
    unsafe { create(Pattern::Rep, endpoint, None) }
}

/// Connect a PUSH socket.
///
/// # Safety
///
/// `endpoint` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_create_push(endpoint: *const c_char) -> c_int {
    unsafe { create(Pattern::Push, endpoint, None) }
}

/// Bind a PULL socket.
///
/// # Safety
///
/// `endpoint` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_create_pull(endpoint: *const c_char) -> c_int {
    unsafe { create(Pattern::Pull, endpoint, None) }
}

/// Send `size` bytes as one frame.
///
/// # Safety
///
/// Unless `size` is 0, `data` must be null or point to `size` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_send(socket: c_int, data: *const c_void, size: c_int) -> c_int {
    let handle = Handle::from_raw(socket);
    if let Err(err) = BRIDGE.validate(handle) {
        return err.status().code();
    }
    let Some(data) = (unsafe { borrow_bytes(data, size) }) else {
        return reject(Status::SendError, "data must be non-null with a non-negative size");
    };
    status_of(BRIDGE.send(handle, data))
}

/// Send a string, without its terminator, as one frame.
///
/// # Safety
///
/// `message` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_send_string(socket: c_int, message: *const c_char) -> c_int {
    let handle = Handle::from_raw(socket);
    if let Err(err) = BRIDGE.validate(handle) {
        return err.status().code();
    }
    let Some(message) = (unsafe { borrow_str(message) }) else {
        return reject(Status::SendError, "message must be a UTF-8 C string");
    };
    status_of(BRIDGE.send_str(handle, message))
}

/// Send a topic frame then a `size`-byte payload frame.
///
/// # Safety
///
/// `topic` must be null or a valid NUL-terminated string. Unless `size` is
/// 0, `data` must be null or point to `size` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_publish(
    socket: c_int,
    topic: *const c_char,
    data: *const c_void,
    size: c_int,
) -> c_int {
    let handle = Handle::from_raw(socket);
    if let Err(err) = BRIDGE.validate(handle) {
        return err.status().code();
    }
    let Some(topic) = (unsafe { borrow_str(topic) }) else {
        return reject(Status::SendError, "topic must be a UTF-8 C string");
    };
    let Some(data) = (unsafe { borrow_bytes(data, size) }) else {
        return reject(Status::SendError, "data must be non-null with a non-negative size");
    };
    status_of(BRIDGE.publish(handle, topic, data))
}

/// Take one frame without blocking into `buffer`.
///
/// Returns `MSGBRIDGE_OK` with the copied length in `*bytes_received`, or
/// `MSGBRIDGE_NO_MESSAGE` with `*bytes_received` set to 0 and `buffer`
/// untouched. Frames longer than `buffer_size` are truncated silently.
///
/// # Safety
///
/// Unless `buffer_size` is 0, `buffer` must be null or point to
/// `buffer_size` writable bytes. `bytes_received` must be null or point to a
/// writable `int`.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_receive(
    socket: c_int,
    buffer: *mut c_void,
    buffer_size: c_int,
    bytes_received: *mut c_int,
) -> c_int {
    let handle = Handle::from_raw(socket);
    if let Err(err) = BRIDGE.validate(handle) {
        return err.status().code();
    }
    let Some(buffer) = (unsafe { borrow_buffer(buffer, buffer_size) }) else {
        return reject(Status::ReceiveError, "buffer must be non-null with a non-negative size");
    };

    let (status, len) = match BRIDGE.receive(handle, buffer) {
        Ok(Some(len)) => (Status::Ok, len),
        Ok(None) => (Status::NoMessage, 0),
        Err(err) => return err.status().code(),
    };
    if !bytes_received.is_null() {
        // SAFETY: non-null; the caller guarantees a writable int. `len` never
        // exceeds `buffer_size`, so it fits.
        unsafe { bytes_received.write(len as c_int) };
    }
    status.code()
}

/// Like [`msgbridge_receive`], but NUL-terminates the copied bytes inside
/// `buffer`, reserving one byte for the terminator.
///
/// # Safety
///
/// Unless `buffer_size` is 0, `buffer` must be null or point to
/// `buffer_size` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn msgbridge_receive_string(
    socket: c_int,
    buffer: *mut c_char,
    buffer_size: c_int,
) -> c_int {
    let handle = Handle::from_raw(socket);
    if let Err(err) = BRIDGE.validate(handle) {
        return err.status().code();
    }
    let Some(buffer) = (unsafe { borrow_buffer(buffer.cast::<c_void>(), buffer_size) }) else {
        return reject(Status::ReceiveError, "buffer must be non-null with a non-negative size");
    };

    match BRIDGE.receive_text(handle, buffer) {
        Ok(Some(_)) => Status::Ok.code(),
        Ok(None) => Status::NoMessage.code(),
        Err(err) => err.status().code(),
    }
}

/// 1 if a frame is receivable right now, 0 if not, or a negative status.
#[no_mangle]
pub extern "C" fn msgbridge_check_message(socket: c_int) -> c_int {
    match BRIDGE.check_message(Handle::from_raw(socket)) {
        Ok(ready) => c_int::from(ready),
        Err(err) => err.status().code(),
    }
}

/// Wait up to `timeout_ms` for a receivable frame: 1 if one arrived, 0 on
/// timeout, or a negative status. A negative timeout waits without limit.
#[no_mangle]
pub extern "C" fn msgbridge_poll(socket: c_int, timeout_ms: c_int) -> c_int {
    let timeout = u64::try_from(timeout_ms).unwrap_or(i32::MAX as u64);
    match BRIDGE.poll(Handle::from_raw(socket), Duration::from_millis(timeout)) {
        Ok(ready) => c_int::from(ready),
        Err(err) => err.status().code(),
    }
}

/// Close a socket. Unknown handles are ignored.
#[no_mangle]
pub extern "C" fn msgbridge_close_socket(socket: c_int) {
    BRIDGE.close(Handle::from_raw(socket));
}

/// Most recent error message.
///
/// The string is owned by the library and stays valid until this thread
/// calls `msgbridge_get_last_error` again. Never null.
#[no_mangle]
pub extern "C" fn msgbridge_get_last_error() -> *const c_char {
    let snapshot = CString::new(BRIDGE.last_error().replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| {
        let mut slot = slot.borrow_mut();
        *slot = snapshot;
        slot.as_ptr()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_bytes_rejects_bad_arguments() {
        unsafe {
            assert!(borrow_bytes(std::ptr::null(), 4).is_none());
            assert!(borrow_bytes(b"abcd".as_ptr().cast(), -1).is_none());
            assert_eq!(borrow_bytes(std::ptr::null(), 0), Some(&[][..]));
            assert_eq!(borrow_bytes(b"abcd".as_ptr().cast(), 2), Some(&b"ab"[..]));
        }
    }

    #[test]
    fn test_borrow_str() {
        unsafe {
            assert_eq!(borrow_str(b"sensors\0".as_ptr().cast()), Some("sensors"));
            assert_eq!(borrow_str(std::ptr::null()), None);
            assert_eq!(borrow_str(b"\xff\0".as_ptr().cast()), None);
        }
    }
}
