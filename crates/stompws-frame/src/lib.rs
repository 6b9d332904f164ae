//! STOMP frame wire codec.
//!
//! A frame on the wire is:
//!
//! ```text
//! COMMAND\n
//! name:value\n          (zero or more)
//! content-length:<n>\n  (when the body is non-empty)
//! \n
//! BODY\0
//! ```
//!
//! Transports may split a frame across messages or pack several frames into
//! one; [`FrameBuffer`] reassembles them. [`FrameWriter`] goes the other way
//! and slices oversized frames into transport-sized chunks.

pub mod codec;
pub mod error;
pub mod escape;
pub mod headers;
pub mod reader;
pub mod utf8;
pub mod version;
pub mod writer;

pub use codec::{
    decode_frame, marshall, unmarshall, unmarshall_bytes, unmarshall_single, Frame, Unmarshalled,
    CONTENT_LENGTH,
};
pub use error::{FrameError, Result};
pub use escape::{escape_header, needs_escaping, unescape_header};
pub use headers::Headers;
pub use reader::FrameBuffer;
pub use utf8::{decode_utf8, encode_utf8, size_of_utf8, trim, LF, NULL};
pub use version::{negotiate, supported_protocols, supported_versions, Version};
pub use writer::{FrameWriter, WriterConfig, DEFAULT_MAX_FRAME_SIZE};
