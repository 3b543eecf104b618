use thiserror::Error;

/// Raised when a byte stream does not hold the value the reader expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Serde error: stream ended early or held an invalid value")]
pub struct SerdeErr;
