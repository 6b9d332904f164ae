use stompws_frame::FrameError;
use stompws_transport::TransportError;

/// Errors returned by the connection engine.
///
/// Protocol failures (an ERROR frame, an unexpected close) are not errors
/// here. They reach the application through the error callback.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Writing a frame failed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The transport failed outside of a frame write.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Whether the error means the transport is already closed.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(TransportError::Closed)
                | ClientError::Frame(FrameError::Transport(TransportError::Closed))
        )
    }
}
