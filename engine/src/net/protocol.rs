// JSON message bodies carried inside frames.
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{EngineError, Result};

/// Decodes one frame body. Any malformed body (bad UTF-8, not JSON, no `type`,
/// missing candle fields) is a `DecodeError`.
pub fn decode_message<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(body).map_err(|e| EngineError::DecodeError(format!("body is not UTF-8: {}", e)))?;
    serde_json::from_str(text).map_err(|e| EngineError::DecodeError(e.to_string()))
}

pub fn encode_message<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}
