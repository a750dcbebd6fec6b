//! Byte-level serialization contract between the log store and its values.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Encode/decode a value to and from the opaque bytes kept in storage.
///
/// The log store never inspects encoded bytes. Any type that can round-trip
/// through this trait can be used as a log record or as a checkpoint.
pub trait Codec: Sized {
    fn encode(&self) -> Result<Vec<u8>, CodecError>;

    fn decode(bytes: &[u8]) -> Result<Self, CodecError>;
}

/// Raw payloads are stored as-is.
impl Codec for Vec<u8> {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.clone())
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bytes.to_vec())
    }
}
