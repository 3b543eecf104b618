use crate::codec::error::CodecError;

/// Converts an entity's typed messages `M` and responses `R` to bytes and
/// back. Used on both sides of the connection so that every invocation is
/// serialized exactly as it would be over a network.
pub trait MessageCodec<M, R>: Send + Sync {
    fn encode_message(&self, message: &M) -> Result<Vec<u8>, CodecError>;

    fn decode_message(&self, bytes: &[u8]) -> Result<M, CodecError>;

    fn encode_response(&self, response: &R) -> Result<Vec<u8>, CodecError>;

    fn decode_response(&self, bytes: &[u8]) -> Result<R, CodecError>;
}
