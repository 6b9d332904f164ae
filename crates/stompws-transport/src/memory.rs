use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{Payload, Transport};

#[derive(Debug, Default)]
struct Shared {
    sent: Vec<Payload>,
    open: bool,
    close_count: usize,
    protocol: Option<String>,
}

/// In-process transport that records everything sent through it.
///
/// Clones share state, so a host can hand one clone to the engine and keep
/// another to inspect traffic or flip the open flag.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryTransport {
    /// Create a closed transport. Call [`MemoryTransport::set_open`] to open it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that is already open.
    pub fn open() -> Self {
        let transport = Self::new();
        transport.set_open(true);
        transport
    }

    /// Flip the open flag.
    pub fn set_open(&self, open: bool) {
        self.lock().open = open;
    }

    /// Set the negotiated subprotocol token.
    pub fn set_protocol(&self, protocol: Option<&str>) {
        self.lock().protocol = protocol.map(str::to_string);
    }

    /// Snapshot of every payload sent so far.
    pub fn sent(&self) -> Vec<Payload> {
        self.lock().sent.clone()
    }

    /// Drain the sent log.
    pub fn take_sent(&self) -> Vec<Payload> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Concatenated bytes of everything sent so far.
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.lock()
            .sent
            .iter()
            .flat_map(|payload| payload.as_bytes().iter().copied())
            .collect()
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // A poisoned lock only means a test thread panicked mid-update; the
        // log itself is still usable.
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, payload: Payload) -> Result<()> {
        let mut shared = self.lock();
        if !shared.open {
            return Err(TransportError::Closed);
        }
        debug!(len = payload.len(), "memory transport send");
        shared.sent.push(payload);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut shared = self.lock();
        shared.open = false;
        shared.close_count += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn protocol(&self) -> Option<String> {
        self.lock().protocol.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_requires_open() {
        let mut transport = MemoryTransport::new();
        let err = transport.send(Payload::from("x")).unwrap_err();
        assert!(matches!(err, TransportError::Closed));

        transport.set_open(true);
        transport.send(Payload::from("x")).unwrap();
        assert_eq!(transport.sent(), vec![Payload::from("x")]);
    }

    #[test]
    fn clones_share_the_log() {
        let observer = MemoryTransport::open();
        let mut engine_side = observer.clone();

        engine_side.send(Payload::from("a")).unwrap();
        engine_side.send(Payload::from(vec![b'b'])).unwrap();

        assert_eq!(observer.sent_bytes(), b"ab");
        assert_eq!(observer.take_sent().len(), 2);
        assert!(observer.sent().is_empty());
    }

    #[test]
    fn protocol_token_is_shared() {
        let observer = MemoryTransport::open();
        let engine_side = observer.clone();
        assert_eq!(engine_side.protocol(), None);

        observer.set_protocol(Some("v11.stomp"));
        assert_eq!(engine_side.protocol().as_deref(), Some("v11.stomp"));
    }

    #[test]
    fn close_counts_and_flips_open() {
        let mut transport = MemoryTransport::open();
        transport.close().unwrap();
        transport.close().unwrap();
        assert!(!transport.is_open());
        assert_eq!(transport.close_count(), 2);
    }
}
