use std::fmt;

use stompws_frame::Frame;
use stompws_transport::CloseEvent;

use crate::stomp::Message;

/// What the error callback receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorEvent {
    /// The server sent an ERROR frame. The connection usually stays open.
    Frame(Frame),
    /// The transport closed without a DISCONNECT from this client.
    Closed(CloseEvent),
}

impl ErrorEvent {
    /// The ERROR frame, if this is one.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            ErrorEvent::Frame(frame) => Some(frame),
            ErrorEvent::Closed(_) => None,
        }
    }

    /// The close event, if the transport closed.
    pub fn close_event(&self) -> Option<&CloseEvent> {
        match self {
            ErrorEvent::Frame(_) => None,
            ErrorEvent::Closed(event) => Some(event),
        }
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorEvent::Frame(frame) => match frame.headers.get("message") {
                Some(message) => write!(f, "server error: {message}"),
                None => f.write_str("server error"),
            },
            ErrorEvent::Closed(event) => match event.code {
                Some(code) => write!(f, "connection closed ({code}): {}", event.reason),
                None => write!(f, "connection closed: {}", event.reason),
            },
        }
    }
}

/// Everything the engine reports to observers, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// CONNECTED received.
    Connected(Frame),
    /// MESSAGE received, whether or not a subscription handled it.
    Message(Message),
    /// RECEIPT received.
    Receipt(Frame),
    /// ERROR received.
    Error(Frame),
    /// The transport closed unexpectedly.
    Closed(CloseEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_message_header() {
        let event = ErrorEvent::Frame(Frame::new("ERROR").header("message", "bad destination"));
        assert_eq!(event.to_string(), "server error: bad destination");
        assert!(event.frame().is_some());
        assert!(event.close_event().is_none());
    }

    #[test]
    fn display_close_event() {
        let event = ErrorEvent::Closed(CloseEvent::new("gone").with_code(1006));
        assert_eq!(event.to_string(), "connection closed (1006): gone");
        assert_eq!(event.close_event().and_then(|e| e.code), Some(1006));
    }
}
