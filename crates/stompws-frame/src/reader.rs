use bytes::BytesMut;

use crate::codec::{decode_frame, Frame};
use crate::version::Version;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Accumulates inbound transport messages and yields complete frames.
///
/// Text and binary messages land in the same byte buffer. NULL and LF are
/// single ASCII bytes in UTF-8, so splitting at the byte level gives the same
/// frames for both encodings, and a multi-byte character split across two
/// binary messages is decoded only once both halves have arrived.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append a text message.
    pub fn push_text(&mut self, text: &str) {
        self.buf.extend_from_slice(text.as_bytes());
    }

    /// Append a binary message.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete frame, parsed for `version`.
    ///
    /// The version is taken per call so a CONNECTED frame can change how the
    /// frames queued behind it are unescaped.
    pub fn next_frame(&mut self, version: Option<Version>) -> Option<Frame> {
        decode_frame(&mut self.buf, version)
    }

    /// Pop every complete frame currently buffered.
    pub fn drain(&mut self, version: Option<Version>) -> Vec<Frame> {
        std::iter::from_fn(|| self.next_frame(version)).collect()
    }

    /// Bytes of the unterminated frame still waiting for more input.
    pub fn partial(&self) -> &[u8] {
        &self.buf
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop any buffered partial frame.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
