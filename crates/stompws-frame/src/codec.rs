use std::fmt::{self, Write as _};

use bytes::{Buf, BytesMut};

use crate::escape::{escape_header, needs_escaping, unescape_header};
use crate::headers::Headers;
use crate::utf8::{decode_utf8, trim, LF, NULL};
use crate::version::Version;

/// Header carrying the UTF-8 byte length of the body.
pub const CONTENT_LENGTH: &str = "content-length";

const CR: u8 = b'\r';

/// A STOMP frame: command, headers, body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// The frame command (`SEND`, `MESSAGE`, ...).
    pub command: String,
    /// Frame headers in emission order.
    pub headers: Headers,
    /// Frame body.
    pub body: String,
}

/// Result of splitting accumulated wire data into frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unmarshalled<P = String> {
    /// Complete frames, in wire order.
    pub frames: Vec<Frame>,
    /// Unterminated tail to prepend to the next chunk.
    pub partial: P,
}

impl Frame {
    /// Create a frame with no headers and an empty body.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Headers::new(),
            body: String::new(),
        }
    }

    /// Create a frame from its parts.
    pub fn from_parts(
        command: impl Into<String>,
        headers: Headers,
        body: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            headers,
            body: body.into(),
        }
    }

    /// Builder-style header setter.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Builder-style body setter.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Wire form without the NULL terminator, escaped for `version`.
    pub fn to_wire(&self, version: Option<Version>) -> String {
        let mut out = String::with_capacity(self.wire_size_hint());
        write_wire(&mut out, &self.command, &self.headers, &self.body, version);
        out
    }

    /// Wire form including the NULL terminator, ready for the transport.
    pub fn marshall(&self, version: Option<Version>) -> String {
        let mut out = self.to_wire(version);
        out.push(char::from(NULL));
        out
    }

    fn wire_size_hint(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.len() + value.len() + 2)
            .sum();
        self.command.len() + headers + self.body.len() + 32
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire(None))
    }
}

/// Serialize a frame and append the NULL terminator.
pub fn marshall(command: &str, headers: &Headers, body: &str, version: Option<Version>) -> String {
    let mut out = String::with_capacity(command.len() + body.len() + 64);
    write_wire(&mut out, command, headers, body, version);
    out.push(char::from(NULL));
    out
}

fn write_wire(out: &mut String, command: &str, headers: &Headers, body: &str, version: Option<Version>) {
    let escape_for = version.filter(|_| needs_escaping(command, version));

    out.push_str(command);
    out.push('\n');
    for (name, value) in headers.iter() {
        // Always recomputed from the body below.
        if name == CONTENT_LENGTH {
            continue;
        }
        match escape_for {
            Some(version) => {
                out.push_str(&escape_header(name, version));
                out.push(':');
                out.push_str(&escape_header(value, version));
            }
            None => {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
        }
        out.push('\n');
    }
    if !body.is_empty() && !headers.content_length_suppressed() {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{CONTENT_LENGTH}:{}", body.len());
    }
    out.push('\n');
    out.push_str(body);
}

/// Parse one frame from its wire text.
///
/// Never fails: malformed input yields a best-effort frame. When headers
/// repeat, the first occurrence wins.
pub fn unmarshall_single(data: &str, version: Option<Version>) -> Frame {
    parse_segment(data.as_bytes(), version)
}

/// Split accumulated wire text into complete frames plus a partial tail.
///
/// Frames end at NULL; any line feeds following a NULL (and a message that is
/// only line feeds) are heartbeats. Feeding a stream through here in pieces,
/// carrying `partial` into the next call, yields the same frames as feeding
/// it in one piece.
pub fn unmarshall(data: &str, version: Option<Version>) -> Unmarshalled {
    let mut buf = BytesMut::from(data.as_bytes());
    let frames = drain_frames(&mut buf, version);
    Unmarshalled {
        frames,
        partial: decode_utf8(&buf),
    }
}

/// Byte-level [`unmarshall`] for binary transports.
pub fn unmarshall_bytes(data: &[u8], version: Option<Version>) -> Unmarshalled<Vec<u8>> {
    let mut buf = BytesMut::from(data);
    let frames = drain_frames(&mut buf, version);
    Unmarshalled {
        frames,
        partial: buf.to_vec(),
    }
}

fn drain_frames(buf: &mut BytesMut, version: Option<Version>) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Some(frame) = decode_frame(buf, version) {
        frames.push(frame);
    }
    frames
}

/// Decode the next complete frame from a buffer.
///
/// Returns `None` when the buffer holds no NULL-terminated frame yet. On
/// success, consumes the frame bytes and its terminator. Heartbeat line feeds
/// in front of a frame are consumed and dropped.
pub fn decode_frame(src: &mut BytesMut, version: Option<Version>) -> Option<Frame> {
    loop {
        let eol = src.iter().take_while(|b| **b == LF || **b == CR).count();
        src.advance(eol);

        let end = src.iter().position(|b| *b == NULL)?;
        let segment = src.split_to(end);
        src.advance(1);

        if segment.is_empty() {
            continue;
        }
        return Some(parse_segment(&segment, version));
    }
}

fn parse_segment(data: &[u8], version: Option<Version>) -> Frame {
    let skip = data.iter().take_while(|b| **b == LF || **b == CR).count();
    let data = &data[skip..];

    let (head, body_start) = match find_divider(data) {
        Some((head_end, body_start)) => (&data[..head_end], body_start),
        None => (data, data.len()),
    };

    let head = decode_utf8(head);
    let mut lines = head.split('\n');
    let command = trim(lines.next().unwrap_or_default()).to_string();
    let unescape_for = version.filter(|_| needs_escaping(&command, version));

    let mut headers = Headers::new();
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let (name, value) = (trim(name), trim(value));
        match unescape_for {
            Some(version) => {
                headers.insert_if_absent(
                    unescape_header(name, version),
                    unescape_header(value, version),
                );
            }
            None => {
                headers.insert_if_absent(name, value);
            }
        }
    }

    let rest = &data[body_start..];
    let body = match headers
        .get(CONTENT_LENGTH)
        .and_then(|len| len.parse::<usize>().ok())
    {
        Some(len) => &rest[..len.min(rest.len())],
        None => match rest.iter().position(|b| *b == NULL) {
            Some(end) => &rest[..end],
            None => rest,
        },
    };

    Frame {
        command,
        headers,
        body: decode_utf8(body),
    }
}

/// Locate the blank line between headers and body.
///
/// Returns `(end of header block, start of body)`. Accepts `\n\n` and
/// `\n\r\n`.
fn find_divider(data: &[u8]) -> Option<(usize, usize)> {
    let mut idx = 0;
    while idx < data.len() {
        if data[idx] == LF {
            match data.get(idx + 1..) {
                Some([LF, ..]) => return Some((idx, idx + 2)),
                Some([CR, LF, ..]) => return Some((idx, idx + 3)),
                _ => {}
            }
        }
        idx += 1;
    }
    None
}
