//! Blocking driver for hosts with a [`Receive`] transport.
//!
//! Waits for the next inbound event, but never past the next heartbeat
//! deadline, hands the event to the client, then runs due timers.

use std::time::{Duration, Instant};

use stompws_transport::{Receive, Transport};

use crate::client::{Client, ConnectionState};
use crate::error::Result;

/// Receive and dispatch at most one event, then run due timers.
///
/// `max_wait` caps how long to block; `None` waits until the next heartbeat
/// deadline, or indefinitely without heartbeats. Returns whether an event
/// was dispatched.
pub fn pump_once<T, R>(client: &mut Client<T>, receiver: &mut R, max_wait: Option<Duration>) -> Result<bool>
where
    T: Transport,
    R: Receive + ?Sized,
{
    let now = client.now();
    let until_deadline = client
        .next_deadline()
        .map(|deadline| deadline.saturating_duration_since(now));
    let wait = match (max_wait, until_deadline) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    let event = receiver.recv(wait)?;
    let dispatched = event.is_some();
    if let Some(event) = event {
        client.handle_event(event)?;
    }
    client.poll_timers()?;
    Ok(dispatched)
}

/// Pump until `done` holds, the connection ends, or `timeout` elapses.
///
/// Returns whether `done` was satisfied. A connection that ends first
/// returns `done`'s verdict at that point.
pub fn run_until<T, R>(
    client: &mut Client<T>,
    receiver: &mut R,
    timeout: Option<Duration>,
    mut done: impl FnMut(&Client<T>) -> bool,
) -> Result<bool>
where
    T: Transport,
    R: Receive + ?Sized,
{
    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    loop {
        if done(client) {
            return Ok(true);
        }
        if client.state() == ConnectionState::Disconnected {
            return Ok(false);
        }
        let remaining = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(false);
                }
                Some(remaining)
            }
            None => None,
        };
        pump_once(client, receiver, remaining)?;
    }
}
