//! Text codec boundary between structured values and snapshots.

use serde_json::Value;

use crate::error::CodecError;

/// Bidirectional conversion between a value and its snapshot text.
///
/// Values must survive `decode(encode(v))` unchanged; diffs are computed on
/// the encoded text, so a lossy codec loses content along the history chain.
pub trait Codec {
    fn encode(&self, value: &Value) -> Result<String, CodecError>;

    fn decode(&self, text: &str) -> Result<Value, CodecError>;
}

/// Compact JSON codec backed by `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, text: &str) -> Result<Value, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
