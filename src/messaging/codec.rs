//! Schema-registry wire framing.
//!
//! ```text
//! +------+----------------+-----------------+
//! | 0x00 | schema id (BE) | record (JSON)   |
//! +------+----------------+-----------------+
//!   1 B        4 B            remaining
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub const MAGIC_BYTE: u8 = 0x00;
const HEADER_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Frame too short: {0} bytes")]
    TooShort(usize),

    #[error("Unknown magic byte {0:#04x}")]
    BadMagic(u8),

    #[error("Schema id mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: u32, actual: u32 },

    #[error("Record serialization error: {0}")]
    Record(#[from] serde_json::Error),
}

pub fn encode<T: Serialize>(schema_id: u32, record: &T) -> Result<Vec<u8>, CodecError> {
    let body = serde_json::to_vec(record)?;
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.push(MAGIC_BYTE);
    frame.extend_from_slice(&schema_id.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

pub fn decode<T: DeserializeOwned>(expected_schema_id: u32, frame: &[u8]) -> Result<T, CodecError> {
    if frame.len() < HEADER_LEN {
        return Err(CodecError::TooShort(frame.len()));
    }
    if frame[0] != MAGIC_BYTE {
        return Err(CodecError::BadMagic(frame[0]));
    }
    let actual = u32::from_be_bytes([frame[1], frame[2], frame[3], frame[4]]);
    if actual != expected_schema_id {
        return Err(CodecError::SchemaMismatch {
            expected: expected_schema_id,
            actual,
        });
    }
    Ok(serde_json::from_slice(&frame[HEADER_LEN..])?)
}
