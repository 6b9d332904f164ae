use serde::{Deserialize, Serialize};
use stompws_frame::{WriterConfig, DEFAULT_MAX_FRAME_SIZE};

/// Client heartbeat preferences, in milliseconds. `0` disables a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heartbeat {
    /// How often the client can send heartbeats.
    pub outgoing: u64,
    /// How often the client wants to hear from the server.
    pub incoming: u64,
}

impl Heartbeat {
    /// No heartbeats in either direction.
    pub fn disabled() -> Self {
        Self {
            outgoing: 0,
            incoming: 0,
        }
    }

    /// Value for the CONNECT `heart-beat` header.
    pub fn header_value(&self) -> String {
        format!("{},{}", self.outgoing, self.incoming)
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            outgoing: 10_000,
            incoming: 10_000,
        }
    }
}

/// Connection engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Send frames as binary transport messages instead of text.
    pub binary: bool,
    /// Heartbeat preferences offered in CONNECT.
    pub heartbeat: Heartbeat,
    /// Emit wire traffic to the debug sink. When false the client starts with
    /// a silent sink.
    pub debug: bool,
    /// Subprotocol tokens offered when the transport was opened. The first
    /// one stands in when the transport reports no negotiated token.
    pub protocols: Vec<String>,
    /// Largest transport message the client sends; bigger frames are sliced.
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary: false,
            heartbeat: Heartbeat::default(),
            debug: true,
            protocols: Vec::new(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ClientConfig {
    /// Outbound framing settings derived from this configuration.
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            max_frame_size: self.max_frame_size,
            binary: self.binary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert!(!config.binary);
        assert!(config.debug);
        assert!(config.protocols.is_empty());
        assert_eq!(config.max_frame_size, 16 * 1024);
        assert_eq!(config.heartbeat.header_value(), "10000,10000");
        assert_eq!(Heartbeat::disabled().header_value(), "0,0");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"binary":true,"heartbeat":{"incoming":0}}"#).unwrap();
        assert!(config.binary);
        assert_eq!(config.heartbeat.outgoing, 10_000);
        assert_eq!(config.heartbeat.incoming, 0);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn json_roundtrip() {
        let config = ClientConfig {
            protocols: vec!["v12.stomp".to_string()],
            debug: false,
            ..ClientConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn writer_config_follows_client_config() {
        let config = ClientConfig {
            binary: true,
            max_frame_size: 512,
            ..ClientConfig::default()
        };
        assert_eq!(
            config.writer_config(),
            WriterConfig {
                max_frame_size: 512,
                binary: true
            }
        );
    }
}
