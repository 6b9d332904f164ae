use bytes::Bytes;
use stompws_transport::{Payload, Transport};
use tracing::trace;

use crate::codec::Frame;
use crate::error::{FrameError, Result};
use crate::version::Version;

/// Largest transport message the writer emits unless configured otherwise.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024;

/// Outbound framing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Maximum size of one transport message, in bytes for binary mode and
    /// in UTF-8 bytes for text mode.
    pub max_frame_size: usize,
    /// Send binary messages instead of text.
    pub binary: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            binary: false,
        }
    }
}

/// Writes marshalled frames to a [`Transport`], slicing oversized frames.
///
/// Chunks go out in order as separate transport sends; the peer's frame
/// reassembly puts them back together.
#[derive(Debug)]
pub struct FrameWriter<T> {
    inner: T,
    config: WriterConfig,
}

impl<T: Transport> FrameWriter<T> {
    /// Create a writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WriterConfig::default())
    }

    /// Create a writer with explicit configuration.
    pub fn with_config(inner: T, config: WriterConfig) -> Self {
        Self { inner, config }
    }

    /// Marshall and send a frame, escaping headers for `version`.
    pub fn write_frame(&mut self, frame: &Frame, version: Option<Version>) -> Result<()> {
        self.send_with(&frame.marshall(version), |line| trace!("{line}"))
    }

    /// Send a heartbeat: a lone line feed.
    pub fn send_heartbeat(&mut self) -> Result<()> {
        self.send_with("\n", |_| {})
    }

    /// Send already-marshalled wire data, reporting progress through `debug`.
    ///
    /// `debug` receives `>>> length <n>` once, then `remaining = <n>` after every
    /// chunk that leaves data behind.
    pub fn send_with(&mut self, wire: &str, mut debug: impl FnMut(&str)) -> Result<()> {
        let max = self.config.max_frame_size;
        if max == 0 {
            return Err(FrameError::ZeroFrameSize);
        }

        debug(&format!(">>> length {}", wire.len()));

        if self.config.binary {
            let mut data = Bytes::copy_from_slice(wire.as_bytes());
            while data.len() > max {
                let chunk = data.split_to(max);
                self.inner.send(Payload::Binary(chunk))?;
                debug(&format!("remaining = {}", data.len()));
            }
            self.inner.send(Payload::Binary(data))?;
        } else {
            let mut data = wire;
            while data.len() > max {
                let (chunk, rest) = data.split_at(char_boundary_at_most(data, max));
                self.inner.send(Payload::Text(chunk.to_string()))?;
                data = rest;
                if data.is_empty() {
                    return Ok(());
                }
                debug(&format!("remaining = {}", data.len()));
            }
            self.inner.send(Payload::Text(data.to_string()))?;
        }
        Ok(())
    }

    /// Close the underlying transport.
    pub fn close(&mut self) -> Result<()> {
        self.inner.close()?;
        Ok(())
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}

/// Largest split point `<= max` that does not cut a character.
///
/// Falls forward to the end of the first character when even that is wider
/// than `max`, so every chunk is non-empty.
fn char_boundary_at_most(s: &str, max: usize) -> usize {
    let mut idx = max.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        idx = s.chars().next().map_or(s.len(), char::len_utf8);
    }
    idx
}

#[cfg(test)]
mod tests {
    use stompws_transport::{MemoryTransport, TransportError};

    use super::*;
    use crate::codec::unmarshall_bytes;

    fn writer(max_frame_size: usize, binary: bool) -> (FrameWriter<MemoryTransport>, MemoryTransport) {
        let transport = MemoryTransport::open();
        let writer = FrameWriter::with_config(
            transport.clone(),
            WriterConfig {
                max_frame_size,
                binary,
            },
        );
        (writer, transport)
    }

    #[test]
    fn small_frame_is_one_text_message() {
        let (mut writer, transport) = writer(DEFAULT_MAX_FRAME_SIZE, false);
        writer
            .write_frame(&Frame::new("SEND").header("destination", "/q").with_body("hi"), None)
            .unwrap();

        assert_eq!(
            transport.sent(),
            vec![Payload::from("SEND\ndestination:/q\ncontent-length:2\n\nhi\0")]
        );
    }

    #[test]
    fn binary_mode_sends_bytes() {
        let (mut writer, transport) = writer(DEFAULT_MAX_FRAME_SIZE, true);
        writer.write_frame(&Frame::new("DISCONNECT"), None).unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Payload::Binary(bytes) if &bytes[..] == b"DISCONNECT\n\n\0"));
    }

    #[test]
    fn oversized_frame_is_sliced_in_order() {
        let (mut writer, transport) = writer(8, true);
        let frame = Frame::new("SEND").with_body("0123456789abcdef");
        writer.write_frame(&frame, None).unwrap();

        let sent = transport.sent();
        assert!(sent.len() > 1);
        assert!(sent.iter().all(|payload| payload.len() <= 8));

        let reassembled = unmarshall_bytes(&transport.sent_bytes(), None);
        assert_eq!(reassembled.frames.len(), 1);
        assert_eq!(reassembled.frames[0].body, "0123456789abcdef");
    }

    #[test]
    fn text_chunks_end_on_character_boundaries() {
        let (mut writer, transport) = writer(5, false);
        writer.send_with("aéé€€b", |_| {}).unwrap();

        let chunks: Vec<String> = transport
            .sent()
            .into_iter()
            .map(|payload| match payload {
                Payload::Text(text) => text,
                Payload::Binary(_) => panic!("expected text"),
            })
            .collect();
        assert_eq!(chunks.concat(), "aéé€€b");
        assert!(chunks.iter().all(|chunk| chunk.len() <= 5));
    }

    #[test]
    fn character_wider_than_limit_still_progresses() {
        let (mut writer, transport) = writer(2, false);
        writer.send_with("€€", |_| {}).unwrap();
        assert_eq!(transport.sent(), vec![Payload::from("€"), Payload::from("€")]);
    }

    #[test]
    fn reports_length_and_remaining() {
        let (mut writer, _transport) = writer(4, false);
        let mut lines = Vec::new();
        writer
            .send_with("0123456789", |line| lines.push(line.to_string()))
            .unwrap();
        assert_eq!(lines, vec![">>> length 10", "remaining = 6", "remaining = 2"]);
    }

    #[test]
    fn heartbeat_is_a_line_feed() {
        let (mut writer, transport) = writer(DEFAULT_MAX_FRAME_SIZE, true);
        writer.send_heartbeat().unwrap();
        assert_eq!(transport.sent_bytes(), b"\n");
    }

    #[test]
    fn zero_frame_size_is_rejected() {
        let (mut writer, _transport) = writer(0, false);
        let err = writer.send_with("x", |_| {}).unwrap_err();
        assert!(matches!(err, FrameError::ZeroFrameSize));
    }

    #[test]
    fn closed_transport_surfaces_error() {
        let (mut writer, transport) = writer(DEFAULT_MAX_FRAME_SIZE, false);
        writer.close().unwrap();
        assert_eq!(transport.close_count(), 1);

        let err = writer.write_frame(&Frame::new("SEND"), None).unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }
}
