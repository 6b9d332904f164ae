use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{CloseEvent, Payload, Receive, Transport, TransportEvent};

/// Configuration for [`TcpTransport`].
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Maximum bytes delivered per inbound message. Default: 8 KiB.
    pub read_chunk_size: usize,
    /// Timeout for establishing the connection. `None` blocks.
    pub connect_timeout: Option<Duration>,
    /// Disable Nagle's algorithm. Default: true.
    pub nodelay: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: 8 * 1024,
            connect_timeout: Some(Duration::from_secs(5)),
            nodelay: true,
        }
    }
}

/// STOMP over a plain TCP stream.
///
/// Each successful read becomes one binary [`Payload`]; frame boundaries are
/// recovered by the engine's reassembly buffer, exactly as with a transport
/// that fragments messages.
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
    open: bool,
    config: TcpConfig,
}

impl TcpTransport {
    /// Connect with default configuration.
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        Self::connect_with_config(addr, &TcpConfig::default())
    }

    /// Connect with explicit configuration.
    pub fn connect_with_config(
        addr: impl ToSocketAddrs + std::fmt::Display,
        config: &TcpConfig,
    ) -> Result<Self> {
        let label = addr.to_string();
        let resolved = addr
            .to_socket_addrs()
            .map_err(|source| TransportError::Connect {
                addr: label.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::Unresolved(label.clone()))?;

        let stream = match config.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&resolved, timeout),
            None => TcpStream::connect(resolved),
        }
        .map_err(|source| TransportError::Connect {
            addr: label.clone(),
            source,
        })?;
        stream.set_nodelay(config.nodelay)?;

        info!(addr = %resolved, "connected tcp transport");
        Ok(Self {
            stream,
            peer: resolved,
            open: true,
            config: config.clone(),
        })
    }

    /// Clone the handle (new file descriptor on the same connection).
    ///
    /// The usual split is one handle owned by the engine for sending and one
    /// kept by the host for [`Receive::recv`].
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            stream: self.stream.try_clone()?,
            peer: self.peer,
            open: self.open,
            config: self.config.clone(),
        })
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, payload: Payload) -> Result<()> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        loop {
            match self.stream.write_all(payload.as_bytes()) {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        self.stream.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        debug!(peer = %self.peer, "closing tcp transport");
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Peer already gone.
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Receive for TcpTransport {
    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<TransportEvent>> {
        if !self.open {
            return Ok(Some(TransportEvent::Close(CloseEvent::new(
                "transport closed locally",
            ))));
        }

        // A zero read timeout is rejected by the OS layer.
        let timeout = timeout.map(|t| t.max(Duration::from_millis(1)));
        self.stream.set_read_timeout(timeout)?;

        let mut chunk = vec![0u8; self.config.read_chunk_size.max(1)];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.open = false;
                    debug!(peer = %self.peer, "peer closed tcp stream");
                    return Ok(Some(TransportEvent::Close(
                        CloseEvent::new("connection closed by peer").clean(),
                    )));
                }
                Ok(n) => {
                    chunk.truncate(n);
                    return Ok(Some(TransportEvent::Message(Payload::Binary(
                        Bytes::from(chunk),
                    ))));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(err)
                    if err.kind() == ErrorKind::ConnectionReset
                        || err.kind() == ErrorKind::ConnectionAborted =>
                {
                    self.open = false;
                    return Ok(Some(TransportEvent::Close(CloseEvent::new(err.to_string()))));
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("peer", &self.peer)
            .field("open", &self.open)
            .finish()
    }
}
