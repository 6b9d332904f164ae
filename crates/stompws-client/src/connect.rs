use std::fmt;

use stompws_frame::Headers;

/// What to put in the CONNECT frame.
///
/// Either a full header map, which may carry extra headers such as `host` or
/// a custom `heart-beat`, or plain credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectRequest {
    /// Caller-built CONNECT headers.
    Headers(Headers),
    /// `login` / `passcode` and an optional virtual `host`.
    Credentials {
        login: String,
        passcode: String,
        host: Option<String>,
    },
}

impl ConnectRequest {
    /// Connect with credentials and no virtual host.
    pub fn credentials(login: impl Into<String>, passcode: impl Into<String>) -> Self {
        ConnectRequest::Credentials {
            login: login.into(),
            passcode: passcode.into(),
            host: None,
        }
    }

    /// Set the virtual host. Turns a header request into one with a `host`
    /// header.
    pub fn with_host(self, host: impl Into<String>) -> Self {
        match self {
            ConnectRequest::Headers(headers) => ConnectRequest::Headers(headers.with("host", host)),
            ConnectRequest::Credentials {
                login, passcode, ..
            } => ConnectRequest::Credentials {
                login,
                passcode,
                host: Some(host.into()),
            },
        }
    }

    /// The CONNECT headers this request stands for.
    pub fn into_headers(self) -> Headers {
        match self {
            ConnectRequest::Headers(headers) => headers,
            ConnectRequest::Credentials {
                login,
                passcode,
                host,
            } => {
                let mut headers = Headers::new().with("login", login).with("passcode", passcode);
                if let Some(host) = host {
                    headers.insert("host", host);
                }
                headers
            }
        }
    }
}

impl Default for ConnectRequest {
    fn default() -> Self {
        ConnectRequest::Headers(Headers::new())
    }
}

impl From<Headers> for ConnectRequest {
    fn from(headers: Headers) -> Self {
        ConnectRequest::Headers(headers)
    }
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectRequest::Headers(headers) => {
                let mut dbg = f.debug_map();
                for (name, value) in headers.iter() {
                    if name == "passcode" {
                        dbg.entry(&name, &format_args!("<redacted:{} bytes>", value.len()));
                    } else {
                        dbg.entry(&name, &value);
                    }
                }
                dbg.finish()
            }
            ConnectRequest::Credentials {
                login,
                passcode,
                host,
            } => f
                .debug_struct("Credentials")
                .field("login", login)
                .field("passcode", &format_args!("<redacted:{} bytes>", passcode.len()))
                .field("host", host)
                .finish(),
        }
    }
}
