use passthrough_serde::{BitReader, BitWrite, Serde, SerdeErr};
use thiserror::Error;

use crate::CodecError;

/// A checked failure produced on the server while handling an invocation.
/// Travels back to the caller inside a `Failed` wire message and is never
/// fatal to the dispatch path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The entity's business logic rejected the invocation
    #[error("Entity rejected the invocation: {message}")]
    User { message: String },

    /// The server could not process the invocation (missing entity, decode
    /// failure on the server side, ...)
    #[error("Server failed to process the invocation: {message}")]
    Server { message: String },

    /// A codec failed while converting the message or response
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl EntityError {
    pub fn user<S: Into<String>>(message: S) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    fn index(&self) -> u8 {
        match self {
            EntityError::User { .. } => 0,
            EntityError::Server { .. } => 1,
            EntityError::Codec(_) => 2,
        }
    }

    fn message(&self) -> &str {
        match self {
            EntityError::User { message } | EntityError::Server { message } => message,
            EntityError::Codec(error) => &error.message,
        }
    }
}

impl Serde for EntityError {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.index().ser(writer);
        self.message().to_string().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let index = u8::de(reader)?;
        let message = String::de(reader)?;
        match index {
            0 => Ok(EntityError::User { message }),
            1 => Ok(EntityError::Server { message }),
            2 => Ok(EntityError::Codec(CodecError { message })),
            // malformed payloads must not take the client down
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        self.index().bit_length() + self.message().to_string().bit_length()
    }
}
