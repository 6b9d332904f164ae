//! Heartbeat negotiation and timers.
//!
//! The server answers CONNECT with `heart-beat: sx,sy`. The client pings
//! every `max(client outgoing, sy)` ms when both sides agree to pings, and
//! checks server liveness every `max(client incoming, sx)` ms when both sides
//! agree to server heartbeats. A liveness check fails once the server has
//! been silent for more than twice its interval.

use std::time::{Duration, Instant};

use crate::config::Heartbeat;

/// Parse a server `heart-beat` header into `(outgoing, incoming)` ms.
///
/// A missing header is `0,0`. A component that is missing or not a number is
/// `0`, which disables that direction.
pub fn parse_server_heartbeat(header: Option<&str>) -> (u64, u64) {
    let mut parts = header
        .unwrap_or("0,0")
        .split(',')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0));
    let outgoing = parts.next().unwrap_or(0);
    let incoming = parts.next().unwrap_or(0);
    (outgoing, incoming)
}

/// Timer periods agreed between client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Negotiated {
    /// Interval between client pings, when pings are enabled.
    pub ping: Option<Duration>,
    /// Interval between liveness checks, when server heartbeats are enabled.
    pub liveness: Option<Duration>,
}

/// Combine the client's preferences with the server's `heart-beat` header.
pub fn negotiate(client: Heartbeat, server_header: Option<&str>) -> Negotiated {
    let (server_outgoing, server_incoming) = parse_server_heartbeat(server_header);
    Negotiated {
        ping: agreed(client.outgoing, server_incoming),
        liveness: agreed(client.incoming, server_outgoing),
    }
}

fn agreed(ours: u64, theirs: u64) -> Option<Duration> {
    if ours == 0 || theirs == 0 {
        None
    } else {
        Some(Duration::from_millis(ours.max(theirs)))
    }
}

/// A repeating timer driven by an external clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period: Duration,
    next_due: Instant,
}

impl Interval {
    /// Start a timer whose first tick is one period after `now`.
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_due: now + period,
        }
    }

    /// Time between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// When the next tick is due.
    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Whether a tick is due at `now`. A due tick reschedules the timer.
    ///
    /// Ticks missed while the host was not polling collapse into one.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        if self.next_due <= now {
            self.next_due = now + self.period;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn parses_server_header() {
        assert_eq!(parse_server_heartbeat(Some("10,20")), (10, 20));
        assert_eq!(parse_server_heartbeat(Some(" 5 , 0 ")), (5, 0));
        assert_eq!(parse_server_heartbeat(None), (0, 0));
    }

    #[test]
    fn malformed_components_disable_that_direction() {
        assert_eq!(parse_server_heartbeat(Some("abc,100")), (0, 100));
        assert_eq!(parse_server_heartbeat(Some("100")), (100, 0));
        assert_eq!(parse_server_heartbeat(Some("")), (0, 0));
    }

    #[test]
    fn negotiation_takes_the_larger_interval() {
        let client = Heartbeat {
            outgoing: 10,
            incoming: 30,
        };
        let agreed = negotiate(client, Some("20,5"));
        assert_eq!(agreed.ping, Some(ms(10)));
        assert_eq!(agreed.liveness, Some(ms(30)));
    }

    #[test]
    fn zero_on_either_side_disables() {
        let agreed = negotiate(Heartbeat::disabled(), Some("10,10"));
        assert_eq!(agreed, Negotiated::default());

        let agreed = negotiate(Heartbeat::default(), Some("0,0"));
        assert_eq!(agreed, Negotiated::default());

        let agreed = negotiate(Heartbeat::default(), None);
        assert_eq!(agreed, Negotiated::default());
    }

    #[test]
    fn interval_ticks_once_per_period() {
        let start = Instant::now();
        let mut timer = Interval::new(ms(10), start);

        assert!(!timer.poll(start + ms(9)));
        assert!(timer.poll(start + ms(10)));
        assert!(!timer.poll(start + ms(15)));
        assert!(timer.poll(start + ms(20)));
        assert_eq!(timer.next_due(), start + ms(30));
    }

    #[test]
    fn missed_ticks_collapse() {
        let start = Instant::now();
        let mut timer = Interval::new(ms(10), start);

        assert!(timer.poll(start + ms(55)));
        assert!(!timer.poll(start + ms(60)));
        assert_eq!(timer.next_due(), start + ms(65));
    }
}
