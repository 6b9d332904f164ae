/// Errors that can occur while writing frames.
///
/// Decoding never fails: malformed input degrades to best-effort frames or
/// stays buffered as a partial frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The transport rejected a send.
    #[error("frame transport error: {0}")]
    Transport(#[from] stompws_transport::TransportError),

    /// The writer was configured with a zero maximum frame size.
    #[error("maximum transport frame size must be greater than zero")]
    ZeroFrameSize,
}

pub type Result<T> = std::result::Result<T, FrameError>;
