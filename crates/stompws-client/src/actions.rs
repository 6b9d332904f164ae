use std::fmt;

use stompws_frame::Headers;

use crate::error::Result;
use crate::stomp::{IdPool, MessageCallback, Stomp, Subscription, Transaction};

/// A verb queued from inside a callback.
pub(crate) enum Action {
    Send {
        destination: String,
        body: String,
        headers: Headers,
    },
    Subscribe {
        id: String,
        headers: Headers,
        callback: MessageCallback,
    },
    Unsubscribe {
        id: String,
        headers: Headers,
    },
    Begin {
        id: String,
    },
    Commit {
        id: String,
    },
    Abort {
        id: String,
    },
    Ack {
        id: String,
        subscription: String,
        headers: Headers,
    },
    Nack {
        id: String,
        subscription: String,
        headers: Headers,
    },
    Disconnect {
        headers: Headers,
    },
}

/// Verbs issued from a callback, executed by the client after it returns.
///
/// Every callback receives one of these instead of the client itself, so a
/// handler can subscribe on CONNECTED or ack a message without re-entering
/// the engine. Queued verbs run in call order. Ids for subscriptions and
/// transactions are assigned immediately, so the returned handles are valid
/// right away.
pub struct Actions {
    queue: Vec<Action>,
    ids: IdPool,
}

impl Actions {
    pub(crate) fn new(ids: IdPool) -> Self {
        Self {
            queue: Vec::new(),
            ids,
        }
    }

    pub(crate) fn into_queue(self) -> Vec<Action> {
        self.queue
    }

    /// Queue a DISCONNECT. The transport is closed once it is sent.
    pub fn disconnect(&mut self, headers: &Headers) {
        self.queue.push(Action::Disconnect {
            headers: headers.clone(),
        });
    }

    /// Number of queued verbs.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Stomp for Actions {
    fn send(&mut self, destination: &str, body: &str, headers: &Headers) -> Result<()> {
        self.queue.push(Action::Send {
            destination: destination.to_string(),
            body: body.to_string(),
            headers: headers.clone(),
        });
        Ok(())
    }

    fn subscribe_boxed(
        &mut self,
        destination: &str,
        callback: MessageCallback,
        headers: &Headers,
    ) -> Result<Subscription> {
        let (id, headers) = self.ids.subscribe_headers(destination, headers);
        self.queue.push(Action::Subscribe {
            id: id.clone(),
            headers,
            callback,
        });
        Ok(Subscription::new(id))
    }

    fn unsubscribe(&mut self, id: &str, headers: &Headers) -> Result<()> {
        self.queue.push(Action::Unsubscribe {
            id: id.to_string(),
            headers: headers.clone(),
        });
        Ok(())
    }

    fn begin(&mut self, transaction: Option<&str>) -> Result<Transaction> {
        let id = self.ids.transaction(transaction);
        self.queue.push(Action::Begin { id: id.clone() });
        Ok(Transaction::new(id))
    }

    fn commit(&mut self, transaction: &str) -> Result<()> {
        self.queue.push(Action::Commit {
            id: transaction.to_string(),
        });
        Ok(())
    }

    fn abort(&mut self, transaction: &str) -> Result<()> {
        self.queue.push(Action::Abort {
            id: transaction.to_string(),
        });
        Ok(())
    }

    fn ack(&mut self, message_id: &str, subscription: &str, headers: &Headers) -> Result<()> {
        self.queue.push(Action::Ack {
            id: message_id.to_string(),
            subscription: subscription.to_string(),
            headers: headers.clone(),
        });
        Ok(())
    }

    fn nack(&mut self, message_id: &str, subscription: &str, headers: &Headers) -> Result<()> {
        self.queue.push(Action::Nack {
            id: message_id.to_string(),
            subscription: subscription.to_string(),
            headers: headers.clone(),
        });
        Ok(())
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actions")
            .field("queued", &self.queue.len())
            .field("ids", &self.ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_are_queued_in_order() {
        let mut actions = Actions::new(IdPool::default());
        actions.send("/q", "hi", &Headers::new()).unwrap();
        let sub = actions.subscribe("/t", |_, _| {}, &Headers::new()).unwrap();
        let tx = actions.begin(None).unwrap();
        tx.commit(&mut actions).unwrap();
        actions.disconnect(&Headers::new());

        assert_eq!(sub.id(), "sub-0");
        assert_eq!(tx.id(), "tx-1");
        assert_eq!(actions.len(), 5);

        let queue = actions.into_queue();
        assert!(matches!(queue[0], Action::Send { .. }));
        assert!(matches!(&queue[1], Action::Subscribe { id, .. } if id == "sub-0"));
        assert!(matches!(&queue[2], Action::Begin { id } if id == "tx-1"));
        assert!(matches!(&queue[3], Action::Commit { id } if id == "tx-1"));
        assert!(matches!(queue[4], Action::Disconnect { .. }));
    }

    #[test]
    fn caller_headers_are_copied() {
        let mut actions = Actions::new(IdPool::default());
        let caller = Headers::from([("receipt", "r-1")]);
        actions.subscribe("/q", |_, _| {}, &caller).unwrap();

        assert_eq!(caller.len(), 1);
        let queue = actions.into_queue();
        match &queue[0] {
            Action::Subscribe { headers, .. } => {
                assert_eq!(headers.get("id"), Some("sub-0"));
                assert_eq!(headers.get("destination"), Some("/q"));
                assert_eq!(headers.get("receipt"), Some("r-1"));
            }
            _ => panic!("expected subscribe"),
        }
    }

    #[test]
    fn queued_subscriptions_skip_ids_already_claimed() {
        let ids = IdPool::default();
        ids.subscribe_headers("/a", &Headers::from([("id", "sub-0")]));

        let mut actions = Actions::new(ids.clone());
        let mine = actions
            .subscribe("/b", |_, _| {}, &Headers::from([("id", "sub-1")]))
            .unwrap();
        let generated = actions.subscribe("/c", |_, _| {}, &Headers::new()).unwrap();

        assert_eq!(mine.id(), "sub-1");
        assert_eq!(generated.id(), "sub-2");
        assert_eq!(ids.transaction(None), "tx-3");
    }
}
