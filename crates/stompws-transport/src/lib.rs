//! Message-oriented transport contract for the stompws STOMP engine.
//!
//! The engine never opens sockets itself. It talks to an object shaped like a
//! WebSocket: something that can send a text or binary message, be closed,
//! report whether it is open, and deliver open/message/close events.
//!
//! - [`Transport`] is the outbound half the engine owns.
//! - [`Receive`] is the inbound half a blocking host polls.
//! - [`MemoryTransport`] records traffic in-process (embedding, tests).
//! - [`TcpTransport`] carries STOMP over a plain TCP stream.

pub mod error;
pub mod memory;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use tcp::{TcpConfig, TcpTransport};
pub use traits::{CloseEvent, Payload, Receive, Transport, TransportEvent};
