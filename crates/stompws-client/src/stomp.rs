use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use stompws_frame::{Frame, Headers, Version};

use crate::actions::Actions;
use crate::error::Result;

/// Subscription callback. Verbs issued through the [`Actions`] run once the
/// callback returns.
pub type MessageCallback = Box<dyn FnMut(&Message, &mut Actions)>;

/// The STOMP verb surface.
///
/// Implemented by [`Client`](crate::Client), which transmits immediately, and
/// by [`Actions`], which queues verbs issued from inside a callback.
pub trait Stomp {
    /// SEND `body` to `destination`.
    fn send(&mut self, destination: &str, body: &str, headers: &Headers) -> Result<()>;

    /// SUBSCRIBE with an already boxed callback.
    fn subscribe_boxed(
        &mut self,
        destination: &str,
        callback: MessageCallback,
        headers: &Headers,
    ) -> Result<Subscription>;

    /// SUBSCRIBE to `destination`. An `id` header is generated when absent.
    fn subscribe<F>(&mut self, destination: &str, callback: F, headers: &Headers) -> Result<Subscription>
    where
        F: FnMut(&Message, &mut Actions) + 'static,
        Self: Sized,
    {
        self.subscribe_boxed(destination, Box::new(callback), headers)
    }

    /// UNSUBSCRIBE and forget the callback for `id`.
    fn unsubscribe(&mut self, id: &str, headers: &Headers) -> Result<()>;

    /// BEGIN a transaction, generating an id when none is given.
    fn begin(&mut self, transaction: Option<&str>) -> Result<Transaction>;

    /// COMMIT a transaction.
    fn commit(&mut self, transaction: &str) -> Result<()>;

    /// ABORT a transaction.
    fn abort(&mut self, transaction: &str) -> Result<()>;

    /// ACK a message.
    fn ack(&mut self, message_id: &str, subscription: &str, headers: &Headers) -> Result<()>;

    /// NACK a message.
    fn nack(&mut self, message_id: &str, subscription: &str, headers: &Headers) -> Result<()>;
}

/// Handle to an active subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: String,
}

impl Subscription {
    pub(crate) fn new(id: String) -> Self {
        Self { id }
    }

    /// The subscription id sent in SUBSCRIBE.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// UNSUBSCRIBE this subscription.
    pub fn unsubscribe(&self, stomp: &mut impl Stomp, headers: &Headers) -> Result<()> {
        stomp.unsubscribe(&self.id, headers)
    }
}

/// Handle to a transaction started with BEGIN.
///
/// The server owns transaction state; this only remembers the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transaction {
    id: String,
}

impl Transaction {
    pub(crate) fn new(id: String) -> Self {
        Self { id }
    }

    /// The transaction id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// COMMIT this transaction.
    pub fn commit(&self, stomp: &mut impl Stomp) -> Result<()> {
        stomp.commit(&self.id)
    }

    /// ABORT this transaction.
    pub fn abort(&self, stomp: &mut impl Stomp) -> Result<()> {
        stomp.abort(&self.id)
    }
}

/// A MESSAGE frame together with what is needed to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The received frame.
    pub frame: Frame,
    /// Id to acknowledge with: the `ack` header on 1.2, else `message-id`.
    pub ack_id: String,
    /// The `subscription` header.
    pub subscription: String,
}

impl Message {
    pub(crate) fn from_frame(frame: Frame, version: Option<Version>) -> Self {
        let non_empty = |name| frame.headers.get(name).filter(|value| !value.is_empty());
        let ack_id = match version {
            Some(Version::V1_2) => non_empty("ack").or_else(|| non_empty("message-id")),
            _ => frame.headers.get("message-id"),
        }
        .unwrap_or_default()
        .to_string();
        let subscription = frame.headers.get("subscription").unwrap_or_default().to_string();
        Self {
            frame,
            ack_id,
            subscription,
        }
    }

    /// Message body.
    pub fn body(&self) -> &str {
        &self.frame.body
    }

    /// Message headers.
    pub fn headers(&self) -> &Headers {
        &self.frame.headers
    }

    /// The `destination` header.
    pub fn destination(&self) -> Option<&str> {
        self.frame.headers.get("destination")
    }

    /// ACK this message.
    pub fn ack(&self, stomp: &mut impl Stomp, headers: &Headers) -> Result<()> {
        stomp.ack(&self.ack_id, &self.subscription, headers)
    }

    /// NACK this message.
    pub fn nack(&self, stomp: &mut impl Stomp, headers: &Headers) -> Result<()> {
        stomp.nack(&self.ack_id, &self.subscription, headers)
    }
}

#[derive(Default)]
struct IdState {
    counter: u64,
    used: HashSet<String>,
}

/// Subscription and transaction ids handed out by one client.
///
/// Shared with every [`Actions`] the client creates. Generated ids are
/// `<prefix>-<n>` and skip anything already claimed on this client,
/// including ids the caller chose.
#[derive(Clone, Default)]
pub(crate) struct IdPool(Rc<RefCell<IdState>>);

impl IdPool {
    fn claim(&self, requested: Option<&str>, prefix: &str) -> String {
        let mut state = self.0.borrow_mut();
        if let Some(id) = requested.filter(|id| !id.is_empty()) {
            state.used.insert(id.to_string());
            return id.to_string();
        }
        loop {
            let id = format!("{prefix}-{}", state.counter);
            state.counter += 1;
            if state.used.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Copy caller headers for SUBSCRIBE, filling in `id` and `destination`.
    pub(crate) fn subscribe_headers(&self, destination: &str, headers: &Headers) -> (String, Headers) {
        let id = self.claim(headers.get("id"), "sub");
        let headers = headers
            .clone()
            .with("id", id.as_str())
            .with("destination", destination);
        (id, headers)
    }

    /// Transaction id to use for BEGIN.
    pub(crate) fn transaction(&self, transaction: Option<&str>) -> String {
        self.claim(transaction, "tx")
    }
}

impl fmt::Debug for IdPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("IdPool")
            .field("counter", &state.counter)
            .field("used", &state.used.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(headers: Headers) -> Frame {
        Frame::from_parts("MESSAGE", headers, "body")
    }

    #[test]
    fn ack_id_uses_ack_header_on_1_2() {
        let frame = message(Headers::from([
            ("subscription", "sub-0"),
            ("message-id", "m-1"),
            ("ack", "a-1"),
        ]));
        let msg = Message::from_frame(frame.clone(), Some(Version::V1_2));
        assert_eq!(msg.ack_id, "a-1");
        assert_eq!(msg.subscription, "sub-0");

        let msg = Message::from_frame(frame, Some(Version::V1_1));
        assert_eq!(msg.ack_id, "m-1");
    }

    #[test]
    fn ack_id_falls_back_to_message_id_on_1_2() {
        let frame = message(Headers::from([("message-id", "m-1")]));
        let msg = Message::from_frame(frame, Some(Version::V1_2));
        assert_eq!(msg.ack_id, "m-1");
        assert_eq!(msg.subscription, "");
        assert_eq!(msg.body(), "body");
    }

    #[test]
    fn generated_ids_share_one_counter() {
        let ids = IdPool::default();
        let (sub, _) = ids.subscribe_headers("/q", &Headers::new());
        assert_eq!(sub, "sub-0");
        assert_eq!(ids.transaction(None), "tx-1");
    }

    #[test]
    fn subscribe_headers_keep_caller_id() {
        let ids = IdPool::default();
        let caller = Headers::from([("id", "mine"), ("ack", "client")]);
        let (id, headers) = ids.subscribe_headers("/queue/a", &caller);

        assert_eq!(id, "mine");
        assert_eq!(headers.get("id"), Some("mine"));
        assert_eq!(headers.get("destination"), Some("/queue/a"));
        assert!(!caller.contains("destination"));
        assert_eq!(ids.subscribe_headers("/q", &Headers::new()).0, "sub-0");
    }

    #[test]
    fn generated_ids_skip_caller_ids() {
        let ids = IdPool::default();
        let taken = Headers::from([("id", "sub-0")]);
        assert_eq!(ids.subscribe_headers("/a", &taken).0, "sub-0");
        assert_eq!(ids.transaction(Some("tx-1")), "tx-1");

        let (id, headers) = ids.subscribe_headers("/b", &Headers::new());
        assert_eq!(id, "sub-2");
        assert_eq!(headers.get("id"), Some("sub-2"));
    }

    #[test]
    fn clones_draw_from_the_same_pool() {
        let ids = IdPool::default();
        let other = ids.clone();
        assert_eq!(ids.transaction(None), "tx-0");
        assert_eq!(other.transaction(None), "tx-1");
        assert_eq!(ids.transaction(Some("")), "tx-2");
    }
}
