//! STOMP protocol versions and subprotocol negotiation.

use std::fmt;

/// Supported STOMP protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    /// STOMP 1.0.
    V1_0,
    /// STOMP 1.1.
    V1_1,
    /// STOMP 1.2.
    V1_2,
}

impl Version {
    /// Every supported version, highest first.
    pub const ALL: [Version; 3] = [Version::V1_2, Version::V1_1, Version::V1_0];

    /// The version string used in `accept-version` / `version` headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Version::V1_0 => "1.0",
            Version::V1_1 => "1.1",
            Version::V1_2 => "1.2",
        }
    }

    /// The transport subprotocol token for this version.
    pub fn protocol(self) -> &'static str {
        match self {
            Version::V1_0 => "v10.stomp",
            Version::V1_1 => "v11.stomp",
            Version::V1_2 => "v12.stomp",
        }
    }

    /// Parse a `version` header value.
    pub fn from_header(value: &str) -> Option<Self> {
        match value.trim() {
            "1.0" => Some(Version::V1_0),
            "1.1" => Some(Version::V1_1),
            "1.2" => Some(Version::V1_2),
            _ => None,
        }
    }

    /// Look up a transport subprotocol token.
    pub fn from_protocol(token: &str) -> Option<Self> {
        Version::ALL
            .into_iter()
            .find(|version| version.protocol() == token)
    }

    /// Whether heartbeats and header escaping apply.
    pub fn is_1_1_or_later(self) -> bool {
        self >= Version::V1_1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comma-separated list of supported versions, highest first.
pub fn supported_versions() -> &'static str {
    "1.2,1.1,1.0"
}

/// Subprotocol tokens to offer when opening a transport.
pub fn supported_protocols() -> [&'static str; 3] {
    [
        Version::V1_0.protocol(),
        Version::V1_1.protocol(),
        Version::V1_2.protocol(),
    ]
}

/// Map a transport subprotocol token to the version to request.
///
/// Unknown or missing tokens fall back to 1.2 after a deprecation warning
/// through `warn`. Transports and servers that never negotiate a subprotocol
/// keep working.
pub fn negotiate(token: Option<&str>, warn: impl FnOnce(&str)) -> Version {
    if let Some(version) = token.and_then(Version::from_protocol) {
        return version;
    }
    warn(&format!(
        "DEPRECATED: {} is not a recognized STOMP version. In next major client version, this will close the connection.",
        token.unwrap_or("<none>")
    ));
    Version::V1_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tokens_map_to_versions() {
        let mut warned = false;
        assert_eq!(negotiate(Some("v10.stomp"), |_| warned = true), Version::V1_0);
        assert_eq!(negotiate(Some("v11.stomp"), |_| warned = true), Version::V1_1);
        assert_eq!(negotiate(Some("v12.stomp"), |_| warned = true), Version::V1_2);
        assert!(!warned);
    }

    #[test]
    fn unknown_token_falls_back_with_warning() {
        let mut warning = None;
        let version = negotiate(Some("v13.stomp"), |msg| warning = Some(msg.to_string()));
        assert_eq!(version, Version::V1_2);
        assert!(warning.unwrap().contains("v13.stomp"));
    }

    #[test]
    fn missing_token_falls_back_with_warning() {
        let mut warned = false;
        assert_eq!(negotiate(None, |_| warned = true), Version::V1_2);
        assert!(warned);
    }

    #[test]
    fn header_values_parse() {
        assert_eq!(Version::from_header("1.1"), Some(Version::V1_1));
        assert_eq!(Version::from_header(" 1.2 "), Some(Version::V1_2));
        assert_eq!(Version::from_header("2.0"), None);
    }

    #[test]
    fn supported_lists() {
        assert_eq!(supported_versions(), "1.2,1.1,1.0");
        assert_eq!(
            supported_protocols(),
            ["v10.stomp", "v11.stomp", "v12.stomp"]
        );
        assert!(Version::V1_1.is_1_1_or_later());
        assert!(!Version::V1_0.is_1_1_or_later());
    }
}
