//! Blocking STOMP session over TCP shared by the networked commands.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use stompws_client::{pump, Actions, Client, ClientConfig, ConnectRequest, ErrorEvent};
use stompws_frame::{Headers, Version};
use stompws_transport::{TcpConfig, TcpTransport};
use tracing::{debug, info};

use crate::cmd::{parse_duration, ConnectArgs};
use crate::exit::{client_error, session_error, transport_error, CliError, CliResult, TIMEOUT};
use crate::logging::engine_output_enabled;

pub struct Session {
    pub client: Client<TcpTransport>,
    receiver: TcpTransport,
    failure: Rc<RefCell<Option<ErrorEvent>>>,
    timeout: Duration,
}

impl Session {
    /// Connect over TCP and wait for CONNECTED.
    pub fn open(args: &ConnectArgs) -> CliResult<Self> {
        let timeout = parse_duration(&args.timeout)?;
        let tcp_config = TcpConfig {
            connect_timeout: Some(timeout),
            ..TcpConfig::default()
        };
        let transport = TcpTransport::connect_with_config(args.addr.as_str(), &tcp_config)
            .map_err(|err| transport_error("connect failed", err))?;
        let receiver = transport
            .try_clone()
            .map_err(|err| transport_error("connect failed", err))?;

        // Plain TCP carries no subprotocol, so the requested version stands in.
        let version = Version::from_header(&args.stomp_version).unwrap_or(Version::V1_2);
        let config = ClientConfig {
            binary: args.binary,
            heartbeat: args.heartbeat,
            protocols: vec![version.protocol().to_string()],
            debug: engine_output_enabled(),
            ..ClientConfig::default()
        };

        let failure = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&failure);
        let mut client = Client::new(transport, config);
        client
            .connect(
                connect_request(args),
                |_, _| {},
                Some(Box::new(move |event: &ErrorEvent, _: &mut Actions| {
                    sink.borrow_mut().get_or_insert_with(|| event.clone());
                })),
            )
            .map_err(|err| client_error("connect failed", err))?;

        let mut session = Self {
            client,
            receiver,
            failure,
            timeout,
        };
        session.wait_for("CONNECTED", |client| client.is_connected())?;
        info!(
            addr = %args.addr,
            version = ?session.client.version(),
            "stomp session open"
        );
        Ok(session)
    }

    /// Pump until `done` holds. Fails on a reported error, a lost
    /// connection, or the session timeout.
    pub fn wait_for(
        &mut self,
        what: &str,
        mut done: impl FnMut(&Client<TcpTransport>) -> bool,
    ) -> CliResult<()> {
        let failure = Rc::clone(&self.failure);
        let reached = pump::run_until(
            &mut self.client,
            &mut self.receiver,
            Some(self.timeout),
            |client| failure.borrow().is_some() || done(client),
        )
        .map_err(|err| client_error(&format!("waiting for {what}"), err))?;

        self.check(&format!("waiting for {what}"))?;
        if !reached {
            return Err(CliError::new(TIMEOUT, format!("timed out waiting for {what}")));
        }
        Ok(())
    }

    /// Run one pump step of at most `max_wait`.
    pub fn pump(&mut self, max_wait: Duration) -> CliResult<()> {
        pump::pump_once(&mut self.client, &mut self.receiver, Some(max_wait))
            .map_err(|err| client_error("receive failed", err))?;
        self.check("session failed")
    }

    /// Fail if the error callback reported anything.
    pub fn check(&self, context: &str) -> CliResult<()> {
        match self.failure.borrow().as_ref() {
            Some(event) => Err(session_error(context, event)),
            None => Ok(()),
        }
    }

    /// Send DISCONNECT and close the transport.
    pub fn close(mut self) -> CliResult<()> {
        self.client
            .disconnect(&Headers::new(), || debug!("stomp session closed"))
            .map_err(|err| client_error("disconnect failed", err))
    }
}

fn connect_request(args: &ConnectArgs) -> ConnectRequest {
    let request = match (&args.login, &args.passcode) {
        (Some(login), Some(passcode)) => ConnectRequest::credentials(login, passcode),
        _ => ConnectRequest::default(),
    };
    match &args.vhost {
        Some(host) => request.with_host(host),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use stompws_client::Heartbeat;

    use super::*;

    fn args(login: Option<&str>, vhost: Option<&str>) -> ConnectArgs {
        ConnectArgs {
            addr: "127.0.0.1:61613".to_string(),
            login: login.map(str::to_string),
            passcode: login.map(|_| "secret".to_string()),
            vhost: vhost.map(str::to_string),
            stomp_version: "1.2".to_string(),
            heartbeat: Heartbeat::disabled(),
            binary: false,
            timeout: "1s".to_string(),
        }
    }

    #[test]
    fn credentials_carry_vhost() {
        let headers = connect_request(&args(Some("guest"), Some("/prod"))).into_headers();
        assert_eq!(headers.get("login"), Some("guest"));
        assert_eq!(headers.get("passcode"), Some("secret"));
        assert_eq!(headers.get("host"), Some("/prod"));
    }

    #[test]
    fn anonymous_connect_may_still_name_a_host() {
        let headers = connect_request(&args(None, Some("/dev"))).into_headers();
        assert_eq!(headers.get("host"), Some("/dev"));
        assert!(!headers.contains("login"));

        assert!(connect_request(&args(None, None)).into_headers().is_empty());
    }
}
