use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use stompws_frame::{marshall, negotiate, Frame, FrameBuffer, FrameWriter, Headers, Version};
use stompws_transport::{CloseEvent, Payload, Transport, TransportEvent};
use tracing::{debug, info};

use crate::actions::{Action, Actions};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::connect::ConnectRequest;
use crate::error::Result;
use crate::event::{ClientEvent, ErrorEvent};
use crate::heartbeat::{self, Interval};
use crate::sink::{DebugSink, SilentSink, TracingSink};
use crate::stomp::{IdPool, Message, MessageCallback, Stomp, Subscription, Transaction};

/// Called once CONNECTED arrives.
pub type ConnectedCallback = Box<dyn FnMut(&Frame, &mut Actions)>;
/// Called on ERROR frames and unexpected transport closes.
pub type ErrorCallback = Box<dyn FnMut(&ErrorEvent, &mut Actions)>;
/// Called on RECEIPT frames.
pub type ReceiptCallback = Box<dyn FnMut(&Frame, &mut Actions)>;

type Observer = Box<dyn FnMut(&ClientEvent)>;

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// `connect` has not been called.
    Idle,
    /// CONNECT pending or sent, waiting for CONNECTED.
    Connecting,
    /// CONNECTED received.
    Connected,
    /// Disconnected or the transport closed. `connect` may be called again.
    Disconnected,
}

/// STOMP connection engine over one transport.
///
/// The client does no I/O of its own beyond sending. The host feeds it
/// transport events through [`Client::handle_event`] and drives heartbeats
/// with [`Client::poll_timers`]; [`crate::pump`] does both for blocking
/// transports.
pub struct Client<T> {
    writer: FrameWriter<T>,
    config: ClientConfig,
    sink: Box<dyn DebugSink>,
    clock: Box<dyn Clock>,
    state: ConnectionState,
    version: Option<Version>,
    pending_connect: Option<Headers>,
    close_handler: bool,
    on_connected: Option<ConnectedCallback>,
    on_error: Option<ErrorCallback>,
    on_receive: Option<MessageCallback>,
    on_receipt: Option<ReceiptCallback>,
    observers: Vec<Observer>,
    subscriptions: HashMap<String, MessageCallback>,
    buffer: FrameBuffer,
    last_server_activity: Instant,
    pinger: Option<Interval>,
    ponger: Option<Interval>,
    ids: IdPool,
}

impl<T: Transport> Client<T> {
    /// Create a client on the system clock.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_clock(transport, config, SystemClock)
    }

    /// Create a client with an explicit clock.
    pub fn with_clock(transport: T, config: ClientConfig, clock: impl Clock + 'static) -> Self {
        let sink: Box<dyn DebugSink> = if config.debug {
            Box::new(TracingSink)
        } else {
            Box::new(SilentSink)
        };
        let now = clock.now();
        Self {
            writer: FrameWriter::with_config(transport, config.writer_config()),
            config,
            sink,
            clock: Box::new(clock),
            state: ConnectionState::Idle,
            version: None,
            pending_connect: None,
            close_handler: false,
            on_connected: None,
            on_error: None,
            on_receive: None,
            on_receipt: None,
            observers: Vec::new(),
            subscriptions: HashMap::new(),
            buffer: FrameBuffer::new(),
            last_server_activity: now,
            pinger: None,
            ponger: None,
            ids: IdPool::default(),
        }
    }

    /// Replace the debug sink.
    pub fn set_debug_sink(&mut self, sink: impl DebugSink + 'static) {
        self.sink = Box::new(sink);
    }

    /// Handle MESSAGE frames that match no subscription.
    pub fn on_receive(&mut self, callback: impl FnMut(&Message, &mut Actions) + 'static) {
        self.on_receive = Some(Box::new(callback));
    }

    /// Handle RECEIPT frames.
    pub fn on_receipt(&mut self, callback: impl FnMut(&Frame, &mut Actions) + 'static) {
        self.on_receipt = Some(Box::new(callback));
    }

    /// Observe every event the engine dispatches.
    pub fn add_observer(&mut self, observer: impl FnMut(&ClientEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether CONNECTED has been received and the connection is still up.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Protocol version from the CONNECTED frame.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Whether a callback is registered for subscription `id`.
    pub fn has_subscription(&self, id: &str) -> bool {
        self.subscriptions.contains_key(id)
    }

    /// Number of registered subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// When the server was last heard from.
    pub fn last_server_activity(&self) -> Instant {
        self.last_server_activity
    }

    /// Current time on the client's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        self.writer.get_ref()
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        self.writer.get_mut()
    }

    /// Consume the client and return the transport.
    pub fn into_transport(self) -> T {
        self.writer.into_inner()
    }

    /// Start the STOMP session.
    ///
    /// CONNECT goes out as soon as the transport is open: right away if it
    /// already is, otherwise on the next [`TransportEvent::Open`].
    pub fn connect<F>(
        &mut self,
        request: ConnectRequest,
        on_connected: F,
        on_error: Option<ErrorCallback>,
    ) -> Result<()>
    where
        F: FnMut(&Frame, &mut Actions) + 'static,
    {
        self.on_connected = Some(Box::new(on_connected));
        self.on_error = on_error;
        self.close_handler = true;
        self.state = ConnectionState::Connecting;
        self.version = None;
        self.buffer.clear();
        self.last_server_activity = self.clock.now();
        self.pending_connect = Some(request.into_headers());

        self.sink.debug("Opening transport...");
        if self.writer.get_ref().is_open() {
            self.handle_open()?;
        }
        Ok(())
    }

    /// Send DISCONNECT and close the transport.
    ///
    /// The close that follows is not reported to the error callback.
    /// `on_disconnect` runs before this returns; it does not wait for the
    /// server.
    pub fn disconnect(&mut self, headers: &Headers, on_disconnect: impl FnOnce()) -> Result<()> {
        let sent = self.transmit("DISCONNECT", headers, "");
        self.close_handler = false;
        let closed = self.writer.close();
        self.clean_up();
        on_disconnect();
        sent?;
        closed?;
        Ok(())
    }

    /// Feed one transport event.
    pub fn handle_event(&mut self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::Open => self.handle_open(),
            TransportEvent::Message(payload) => self.handle_message(payload),
            TransportEvent::Close(event) => self.handle_close(event),
        }
    }

    /// The transport opened: send the pending CONNECT, if any.
    pub fn handle_open(&mut self) -> Result<()> {
        let Some(mut headers) = self.pending_connect.take() else {
            return Ok(());
        };
        self.sink.debug("Transport opened...");

        let token = self
            .writer
            .get_ref()
            .protocol()
            .or_else(|| self.config.protocols.first().cloned());
        let sink = &self.sink;
        let version = negotiate(token.as_deref(), |message| sink.warn(message));

        headers.insert("accept-version", version.as_str());
        if headers.get("heart-beat").map_or(true, str::is_empty) {
            headers.insert("heart-beat", self.config.heartbeat.header_value());
        }
        self.transmit("CONNECT", &headers, "")
    }

    /// A transport message arrived.
    pub fn handle_message(&mut self, payload: Payload) -> Result<()> {
        self.last_server_activity = self.clock.now();

        let data = payload.as_bytes();
        if data == b"\n" {
            self.sink.debug("<<< PONG");
            return Ok(());
        }
        self.sink.debug(&format!("<<< {}", String::from_utf8_lossy(data)));

        // Every complete frame is dispatched; the first failure is returned.
        self.buffer.push_bytes(data);
        let mut result = Ok(());
        while let Some(frame) = self.buffer.next_frame(self.version) {
            let dispatched = self.dispatch(frame);
            if result.is_ok() {
                result = dispatched;
            }
        }
        result
    }

    /// The transport closed.
    ///
    /// Ignored after [`Client::disconnect`] and after the close path already
    /// ran once for this connection.
    pub fn handle_close(&mut self, event: CloseEvent) -> Result<()> {
        if !self.close_handler {
            return Ok(());
        }
        self.close_handler = false;
        self.pending_connect = None;

        self.sink.debug(&format!("Whoops! Lost connection: {}", event.reason));
        self.clean_up();
        self.notify(|| ClientEvent::Closed(event.clone()));
        self.emit_error(ErrorEvent::Closed(event))
    }

    /// Run heartbeat timers that are due.
    ///
    /// Sends a ping when the ping timer fires. When the liveness timer fires
    /// and the server has been silent for more than twice its interval, the
    /// transport is closed and the close path runs immediately. A failed ping
    /// does not skip the liveness check; its error is returned afterwards.
    pub fn poll_timers(&mut self) -> Result<()> {
        let now = self.clock.now();

        let mut pinged = Ok(());
        if self.pinger.as_mut().is_some_and(|timer| timer.poll(now)) {
            pinged = self.writer.send_heartbeat();
            self.sink.debug(">>> PING");
        }
        self.check_liveness(now)?;
        pinged?;
        Ok(())
    }

    fn check_liveness(&mut self, now: Instant) -> Result<()> {
        let Some(ponger) = self.ponger.as_mut() else {
            return Ok(());
        };
        if !ponger.poll(now) {
            return Ok(());
        }
        let ttl = ponger.period();
        let silence = now.saturating_duration_since(self.last_server_activity);
        if silence > ttl * 2 {
            self.sink.debug(&format!(
                "did not receive server activity for the last {}ms",
                silence.as_millis()
            ));
            let closed = self.writer.close();
            self.handle_close(CloseEvent::new("no server activity"))?;
            closed?;
        }
        Ok(())
    }

    /// Earliest instant a heartbeat timer is due, if any timer runs.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.pinger, self.ponger]
            .iter()
            .flatten()
            .map(Interval::next_due)
            .min()
    }

    fn dispatch(&mut self, frame: Frame) -> Result<()> {
        match frame.command.as_str() {
            "CONNECTED" => {
                self.sink.debug(&format!(
                    "connected to server {}",
                    frame.headers.get("server").unwrap_or_default()
                ));
                self.state = ConnectionState::Connected;
                self.version = frame.headers.get("version").and_then(Version::from_header);
                info!(version = ?self.version, "stomp session established");
                self.setup_heartbeat(&frame.headers);
                self.notify(|| ClientEvent::Connected(frame.clone()));

                let mut actions = Actions::new(self.ids.clone());
                if let Some(callback) = self.on_connected.as_mut() {
                    callback(&frame, &mut actions);
                }
                self.run(actions)
            }
            "MESSAGE" => {
                let message = Message::from_frame(frame, self.version);
                self.notify(|| ClientEvent::Message(message.clone()));

                let mut actions = Actions::new(self.ids.clone());
                let handler = match self.subscriptions.get_mut(&message.subscription) {
                    Some(callback) => Some(callback),
                    None => self.on_receive.as_mut(),
                };
                match handler {
                    Some(callback) => callback(&message, &mut actions),
                    None => self
                        .sink
                        .debug(&format!("Unhandled received MESSAGE: {}", message.frame)),
                }
                self.run(actions)
            }
            "RECEIPT" => {
                self.notify(|| ClientEvent::Receipt(frame.clone()));

                let mut actions = Actions::new(self.ids.clone());
                if let Some(callback) = self.on_receipt.as_mut() {
                    callback(&frame, &mut actions);
                }
                self.run(actions)
            }
            "ERROR" => {
                self.notify(|| ClientEvent::Error(frame.clone()));
                self.emit_error(ErrorEvent::Frame(frame))
            }
            _ => {
                self.sink.debug(&format!("Unhandled frame: {frame}"));
                Ok(())
            }
        }
    }

    fn emit_error(&mut self, event: ErrorEvent) -> Result<()> {
        let mut actions = Actions::new(self.ids.clone());
        if let Some(callback) = self.on_error.as_mut() {
            callback(&event, &mut actions);
        }
        self.run(actions)
    }

    fn notify(&mut self, event: impl FnOnce() -> ClientEvent) {
        if self.observers.is_empty() {
            return;
        }
        let event = event();
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    fn run(&mut self, actions: Actions) -> Result<()> {
        for action in actions.into_queue() {
            self.execute(action)?;
        }
        Ok(())
    }

    fn execute(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Send {
                destination,
                body,
                headers,
            } => self.send(&destination, &body, &headers),
            Action::Subscribe {
                id,
                headers,
                callback,
            } => self.register_subscription(id, &headers, callback),
            Action::Unsubscribe { id, headers } => self.unsubscribe(&id, &headers),
            Action::Begin { id } => self.transmit_transaction("BEGIN", &id),
            Action::Commit { id } => self.commit(&id),
            Action::Abort { id } => self.abort(&id),
            Action::Ack {
                id,
                subscription,
                headers,
            } => self.ack(&id, &subscription, &headers),
            Action::Nack {
                id,
                subscription,
                headers,
            } => self.nack(&id, &subscription, &headers),
            Action::Disconnect { headers } => self.disconnect(&headers, || {}),
        }
    }

    fn setup_heartbeat(&mut self, headers: &Headers) {
        self.pinger = None;
        self.ponger = None;
        if !self.version.is_some_and(Version::is_1_1_or_later) {
            return;
        }

        let agreed = heartbeat::negotiate(self.config.heartbeat, headers.get("heart-beat"));
        let now = self.clock.now();
        if let Some(period) = agreed.ping {
            self.sink
                .debug(&format!("send PING every {}ms", period.as_millis()));
            self.pinger = Some(Interval::new(period, now));
        }
        if let Some(period) = agreed.liveness {
            self.sink
                .debug(&format!("check PONG every {}ms", period.as_millis()));
            self.ponger = Some(Interval::new(period, now));
        }
    }

    fn clean_up(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!(state = ?self.state, "stomp connection cleaned up");
        }
        self.state = ConnectionState::Disconnected;
        self.pinger = None;
        self.ponger = None;
    }

    fn register_subscription(
        &mut self,
        id: String,
        headers: &Headers,
        callback: MessageCallback,
    ) -> Result<()> {
        self.subscriptions.insert(id, callback);
        self.transmit("SUBSCRIBE", headers, "")
    }

    fn transmit_transaction(&mut self, command: &str, transaction: &str) -> Result<()> {
        let headers = Headers::new().with("transaction", transaction);
        self.transmit(command, &headers, "")
    }

    fn ack_headers(&self, message_id: &str, subscription: &str, headers: &Headers) -> Headers {
        let id_header = if self.version == Some(Version::V1_2) {
            "id"
        } else {
            "message-id"
        };
        headers
            .clone()
            .with(id_header, message_id)
            .with("subscription", subscription)
    }

    fn transmit(&mut self, command: &str, headers: &Headers, body: &str) -> Result<()> {
        let out = marshall(command, headers, body, self.version);
        self.sink.debug(&format!(">>> {out}"));
        let sink = &self.sink;
        self.writer.send_with(&out, |line| sink.debug(line))?;
        Ok(())
    }
}

impl<T: Transport> Stomp for Client<T> {
    fn send(&mut self, destination: &str, body: &str, headers: &Headers) -> Result<()> {
        let headers = headers.clone().with("destination", destination);
        self.transmit("SEND", &headers, body)
    }

    fn subscribe_boxed(
        &mut self,
        destination: &str,
        callback: MessageCallback,
        headers: &Headers,
    ) -> Result<Subscription> {
        let (id, headers) = self.ids.subscribe_headers(destination, headers);
        self.register_subscription(id.clone(), &headers, callback)?;
        Ok(Subscription::new(id))
    }

    fn unsubscribe(&mut self, id: &str, headers: &Headers) -> Result<()> {
        self.subscriptions.remove(id);
        let headers = headers.clone().with("id", id);
        self.transmit("UNSUBSCRIBE", &headers, "")
    }

    fn begin(&mut self, transaction: Option<&str>) -> Result<Transaction> {
        let id = self.ids.transaction(transaction);
        self.transmit_transaction("BEGIN", &id)?;
        Ok(Transaction::new(id))
    }

    fn commit(&mut self, transaction: &str) -> Result<()> {
        self.transmit_transaction("COMMIT", transaction)
    }

    fn abort(&mut self, transaction: &str) -> Result<()> {
        self.transmit_transaction("ABORT", transaction)
    }

    fn ack(&mut self, message_id: &str, subscription: &str, headers: &Headers) -> Result<()> {
        let headers = self.ack_headers(message_id, subscription, headers);
        self.transmit("ACK", &headers, "")
    }

    fn nack(&mut self, message_id: &str, subscription: &str, headers: &Headers) -> Result<()> {
        let headers = self.ack_headers(message_id, subscription, headers);
        self.transmit("NACK", &headers, "")
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subscriptions: Vec<_> = self.subscriptions.keys().collect();
        subscriptions.sort();
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("version", &self.version)
            .field("subscriptions", &subscriptions)
            .field("buffered", &self.buffer.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use stompws_frame::unmarshall_bytes;
    use stompws_transport::MemoryTransport;

    use super::*;
    use crate::config::Heartbeat;

    fn client() -> (Client<MemoryTransport>, MemoryTransport) {
        let transport = MemoryTransport::open();
        let config = ClientConfig {
            debug: false,
            heartbeat: Heartbeat::disabled(),
            ..ClientConfig::default()
        };
        (Client::new(transport.clone(), config), transport)
    }

    fn sent_commands(transport: &MemoryTransport) -> Vec<String> {
        unmarshall_bytes(&transport.sent_bytes(), None)
            .frames
            .into_iter()
            .map(|frame| frame.command)
            .collect()
    }

    #[test]
    fn starts_idle() {
        let (client, transport) = client();
        assert_eq!(client.state(), ConnectionState::Idle);
        assert!(!client.is_connected());
        assert!(transport.sent().is_empty());
        assert_eq!(client.next_deadline(), None);
    }

    #[test]
    fn open_without_pending_connect_is_a_noop() {
        let (mut client, transport) = client();
        client.handle_open().unwrap();
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn connect_is_sent_once() {
        let (mut client, transport) = client();
        client
            .connect(ConnectRequest::default(), |_, _| {}, None)
            .unwrap();
        client.handle_event(TransportEvent::Open).unwrap();
        assert_eq!(sent_commands(&transport), vec!["CONNECT"]);
        assert_eq!(client.state(), ConnectionState::Connecting);
    }

    #[test]
    fn version_1_0_does_not_escape_or_ack_by_id() {
        let (mut client, transport) = client();
        client
            .connect(ConnectRequest::default(), |_, _| {}, None)
            .unwrap();
        client
            .handle_message(Payload::from("CONNECTED\nversion:1.0\n\n\0"))
            .unwrap();
        transport.take_sent();

        client.ack("m-1", "sub-0", &Headers::new()).unwrap();
        let frames = unmarshall_bytes(&transport.sent_bytes(), None).frames;
        assert_eq!(frames[0].headers.get("message-id"), Some("m-1"));
        assert!(!frames[0].headers.contains("id"));
    }

    #[test]
    fn unknown_frames_are_ignored() {
        let (mut client, _transport) = client();
        client
            .handle_message(Payload::from("BOGUS\n\n\0"))
            .unwrap();
        assert_eq!(client.state(), ConnectionState::Idle);
    }

    #[test]
    fn debug_output_lists_subscriptions() {
        let (mut client, _transport) = client();
        client.subscribe("/q", |_, _| {}, &Headers::new()).unwrap();
        let rendered = format!("{client:?}");
        assert!(rendered.contains("sub-0"));
    }
}
