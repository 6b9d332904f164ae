//! STOMP connection engine.
//!
//! [`Client`] owns one transport and runs the STOMP session on it: CONNECT
//! and version negotiation, heartbeats, subscriptions, transactions and
//! acknowledgements. It is event-driven and single-threaded. The host
//! delivers transport events and polls timers; callbacks receive an
//! [`Actions`] queue for any verbs they want to issue.
//!
//! ```no_run
//! use stompws_client::{Client, ClientConfig, ConnectRequest, Stomp};
//! use stompws_frame::Headers;
//! use stompws_transport::TcpTransport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = TcpTransport::connect("127.0.0.1:61613")?;
//! let mut receiver = transport.try_clone()?;
//! let mut client = Client::new(transport, ClientConfig::default());
//!
//! client.connect(
//!     ConnectRequest::credentials("guest", "guest"),
//!     |_frame, actions| {
//!         let _ = actions.subscribe(
//!             "/queue/demo",
//!             |message, _| println!("{}", message.body()),
//!             &Headers::new(),
//!         );
//!     },
//!     None,
//! )?;
//! stompws_client::pump::run_until(&mut client, &mut receiver, None, |_| false)?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod client;
pub mod clock;
pub mod config;
pub mod connect;
pub mod error;
pub mod event;
pub mod heartbeat;
pub mod pump;
pub mod sink;
pub mod stomp;

#[cfg(feature = "async")]
pub mod stream;

pub use actions::Actions;
pub use client::{Client, ConnectedCallback, ConnectionState, ErrorCallback, ReceiptCallback};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, Heartbeat};
pub use connect::ConnectRequest;
pub use error::{ClientError, Result};
pub use event::{ClientEvent, ErrorEvent};
pub use heartbeat::{Interval, Negotiated};
pub use sink::{DebugSink, SilentSink, TracingSink};
pub use stomp::{Message, MessageCallback, Stomp, Subscription, Transaction};

#[cfg(feature = "async")]
pub use stream::EventStream;
