use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// One transport-level message, either text or a binary buffer.
///
/// WebSocket-like transports deliver both shapes; the engine branches on the
/// variant to pick its decode path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A UTF-8 text message.
    Text(String),
    /// A binary message.
    Binary(Bytes),
}

impl Payload {
    /// Length of the message in bytes.
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    /// Whether the message carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of the message, whichever variant it is.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes.as_ref(),
        }
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Binary(Bytes::from(value))
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Binary(value)
    }
}

/// Details of a transport close, mirroring a WebSocket close event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseEvent {
    /// Close code, when the transport has one.
    pub code: Option<u16>,
    /// Human-readable reason.
    pub reason: String,
    /// Whether the closing handshake completed.
    pub was_clean: bool,
}

impl CloseEvent {
    /// Create a close event with a reason and no code.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: reason.into(),
            was_clean: false,
        }
    }

    /// Attach a close code.
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Mark the close as clean.
    pub fn clean(mut self) -> Self {
        self.was_clean = true;
        self
    }
}

/// Events a transport delivers to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The transport finished opening.
    Open,
    /// A message arrived.
    Message(Payload),
    /// The transport closed.
    Close(CloseEvent),
}

/// Outbound half of a WebSocket-like transport.
///
/// Sends are fire-and-forget: the implementation preserves ordering and
/// applies whatever backpressure it has internally.
pub trait Transport {
    /// Send one message.
    fn send(&mut self, payload: Payload) -> Result<()>;

    /// Close the transport. Closing twice is not an error.
    fn close(&mut self) -> Result<()>;

    /// Whether the transport is open and can send.
    fn is_open(&self) -> bool;

    /// Subprotocol token negotiated by the transport (e.g. `v12.stomp`).
    fn protocol(&self) -> Option<String> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, payload: Payload) -> Result<()> {
        (**self).send(payload)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn protocol(&self) -> Option<String> {
        (**self).protocol()
    }
}

/// Inbound half of a transport, for hosts that poll instead of receiving
/// callbacks.
pub trait Receive {
    /// Wait for the next event.
    ///
    /// `None` blocks until an event arrives. Returns `Ok(None)` when the
    /// timeout elapsed without an event.
    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<TransportEvent>>;
}
