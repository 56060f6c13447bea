//! Base58 text encoding (Bitcoin alphabet)
//!
//! Addresses, keys, signatures and legacy transaction text all use this
//! encoding. Leading zero bytes map one-to-one to leading `'1'`s.

use crate::error::{Result, TxWireError};

/// Encode raw bytes as base58 text.
pub fn encode(input: &[u8]) -> String {
    bs58::encode(input).into_string()
}

/// Decode base58 text. Any character outside the alphabet (whitespace
/// included) fails the whole decode.
pub fn decode(input: &str) -> Result<Vec<u8>> {
    bs58::decode(input).into_vec().map_err(|err| match err {
        bs58::decode::Error::NonAsciiCharacter { index } => TxWireError::InvalidBase58 {
            character: input
                .get(index..)
                .and_then(|rest| rest.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER),
            position: index,
        },
        other => other.into(),
    })
}

/// Decode base58 text that must yield exactly `N` bytes.
pub fn decode_array<const N: usize>(input: &str) -> Result<[u8; N]> {
    let bytes = decode(input)?;
    bytes.as_slice().try_into().map_err(|_| {
        TxWireError::DecodingError(format!(
            "expected {} decoded bytes, got {}",
            N,
            bytes.len()
        ))
    })
}
