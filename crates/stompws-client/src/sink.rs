//! Injected debug output for wire traffic.

use tracing::{debug, warn};

/// Receives the engine's human-readable trace of wire traffic.
pub trait DebugSink {
    /// A trace line (`>>> ...`, `<<< ...`, heartbeat and fragment notes).
    fn debug(&self, message: &str);

    /// Something the caller should notice, such as a version fallback.
    fn warn(&self, message: &str) {
        self.debug(message);
    }
}

/// Forwards to `tracing` under the `stompws::client` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn debug(&self, message: &str) {
        debug!(target: "stompws::client", "{message}");
    }

    fn warn(&self, message: &str) {
        warn!(target: "stompws::client", "{message}");
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl DebugSink for SilentSink {
    fn debug(&self, _message: &str) {}
}

impl<F: Fn(&str)> DebugSink for F {
    fn debug(&self, message: &str) {
        self(message)
    }
}
