//! TTS adapter error types.

use hawker_core::ports::SynthesisError;

/// Errors from the provider dial, stream or local materialization.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// The governing cancellation token fired.
    #[error("synthesis cancelled")]
    Cancelled,

    /// WebSocket dial failed.
    #[error("TTS dial failed: {0}")]
    Dial(String),

    /// The stream broke before the final audio frame arrived.
    #[error("TTS stream failed: {0}")]
    Stream(String),

    /// The provider answered with an error frame. The decoded text is
    /// for logs only and must never reach clients.
    #[error("TTS provider error: {0}")]
    Provider(String),

    /// Local filesystem failure (mkdir, tmp write, rename).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TtsError> for SynthesisError {
    fn from(e: TtsError) -> Self {
        match e {
            TtsError::Cancelled => SynthesisError::Cancelled,
            TtsError::Io(io) => SynthesisError::Io(io),
            other => SynthesisError::Upstream(other.to_string()),
        }
    }
}
