//! Async event stream over the client's observer hook.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use stompws_transport::Transport;
use tokio::sync::mpsc;

use crate::client::Client;
use crate::event::ClientEvent;

/// Stream of [`ClientEvent`]s.
///
/// Events are queued as the client dispatches them, so the stream can be
/// consumed from another task than the one driving the client. The stream
/// ends once the client is dropped.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<ClientEvent>,
}

impl Stream for EventStream {
    type Item = ClientEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl<T: Transport> Client<T> {
    /// Subscribe to every event this client dispatches from now on.
    pub fn event_stream(&mut self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.add_observer(move |event| {
            // Receiver gone means nobody is listening anymore.
            let _ = tx.send(event.clone());
        });
        EventStream { rx }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use stompws_frame::Headers;
    use stompws_transport::{MemoryTransport, Payload};

    use crate::config::{ClientConfig, Heartbeat};
    use crate::connect::ConnectRequest;
    use crate::stomp::Stomp;

    use super::*;

    #[tokio::test]
    async fn stream_yields_dispatched_events() {
        let config = ClientConfig {
            debug: false,
            heartbeat: Heartbeat::disabled(),
            ..ClientConfig::default()
        };
        let mut client = Client::new(MemoryTransport::open(), config);
        let mut events = client.event_stream();

        client
            .connect(ConnectRequest::default(), |_, _| {}, None)
            .unwrap();
        client
            .handle_message(Payload::from("CONNECTED\nversion:1.2\n\n\0"))
            .unwrap();
        let sub = client.subscribe("/topic/a", |_, _| {}, &Headers::new()).unwrap();
        client
            .handle_message(Payload::from(format!(
                "MESSAGE\nsubscription:{}\nmessage-id:1\n\nhello\0",
                sub.id()
            )))
            .unwrap();
        drop(client);

        let connected = events.next().await.unwrap();
        assert!(matches!(connected, ClientEvent::Connected(_)));
        match events.next().await.unwrap() {
            ClientEvent::Message(message) => assert_eq!(message.body(), "hello"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(events.next().await.is_none());
    }
}
