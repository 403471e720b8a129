//! Process-wide last-error string.
//!
//! One string per bridge, overwritten by every failing operation. It is not
//! scoped to a handle or a thread: when two calls fail concurrently, the
//! message a caller reads back may belong to the other call. Only a single
//! write or read is atomic.

use parking_lot::Mutex;
use tracing::warn;

/// Holder of the most recent failure message.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    last: Mutex<String>,
}

impl ErrorReporter {
    /// Create a reporter with an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the last error.
    pub fn record(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("[BRIDGE] {}", message);
        *self.last.lock() = message;
    }

    /// The current last error (empty if nothing failed yet).
    pub fn last(&self) -> String {
        self.last.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrites_instead_of_appending() {
        let reporter = ErrorReporter::new();
        assert_eq!(reporter.last(), "");

        reporter.record("first");
        reporter.record("second");
        assert_eq!(reporter.last(), "second");
    }
}
