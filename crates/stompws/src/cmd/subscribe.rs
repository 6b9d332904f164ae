use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stompws_client::{Actions, Message, Stomp};
use stompws_frame::Headers;
use tracing::warn;

use crate::cmd::session::Session;
use crate::cmd::{AckMode, SubscribeArgs};
use crate::exit::{client_error, CliError, CliResult, INTERNAL, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_frame, OutputFormat};

/// Upper bound on one blocking read, so Ctrl-C is noticed promptly.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(args: SubscribeArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut session = Session::open(&args.connect)?;

    let received = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&received);
    let ack = args.ack;
    let headers = Headers::new().with("ack", ack.header_value());
    session
        .client
        .subscribe(
            &args.destination,
            move |message: &Message, actions: &mut Actions| {
                print_frame(&message.frame, format);
                counter.set(counter.get() + 1);
                if ack != AckMode::Auto {
                    if let Err(err) = message.ack(actions, &Headers::new()) {
                        warn!(error = %err, message_id = %message.ack_id, "ack failed");
                    }
                }
            },
            &headers,
        )
        .map_err(|err| client_error("subscribe failed", err))?;

    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| received.get() >= count) {
            break;
        }
        session.pump(POLL_INTERVAL)?;
        if !session.client.is_connected() {
            return Err(CliError::new(
                TRANSPORT_ERROR,
                "connection ended while subscribed",
            ));
        }
    }

    session.close()?;
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
