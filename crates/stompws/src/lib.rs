//! STOMP 1.0/1.1/1.2 client engine for message-oriented transports.
//!
//! stompws speaks STOMP over anything shaped like a WebSocket: a transport
//! that sends text or binary messages and reports open, message and close
//! events. The engine handles framing, version negotiation, heartbeats,
//! subscriptions, transactions and acknowledgements.
//!
//! # Crate Structure
//!
//! - [`transport`]: transport contract, in-memory and TCP transports
//! - [`frame`]: frame codec, reassembly buffer and fragmenting writer
//! - [`client`]: the connection engine (behind the `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use stompws_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use stompws_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use stompws_client::*;
}
