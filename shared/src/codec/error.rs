use thiserror::Error;

/// Raised by a [`MessageCodec`](crate::MessageCodec) that cannot convert a
/// typed message to bytes or back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Codec failed: {message}")]
pub struct CodecError {
    pub message: String,
}

impl CodecError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}
