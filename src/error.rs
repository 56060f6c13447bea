//! Error types for TxWire

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TxWireError {
    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Invalid base58 character {character:?} at position {position}")]
    InvalidBase58 { character: char, position: usize },

    #[error("Buffer too small: needed {needed} bytes, got {available}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
    },

    #[error("Unsupported field type for `{field}`: {reason}")]
    UnsupportedFieldType { field: String, reason: String },

    #[error("Layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error("Invalid instruction data: {0}")]
    InvalidInstruction(String),

    #[error("Account error: {0}")]
    AccountError(String),

    /// A compiled message referenced a key that is not in its own account
    /// table. Never caused by caller input.
    #[error("Internal consistency violation: {0}")]
    InternalConsistency(String),

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Signature error: {0}")]
    SignatureError(String),

    /// The signature primitive failed to run, as opposed to a signature that
    /// simply does not match.
    #[error("Cryptographic failure: {0}")]
    CryptoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed reply: {0}")]
    ReplyError(String),

    #[error("Transport error: {0}")]
    TransportError(String),
}

impl From<bs58::decode::Error> for TxWireError {
    fn from(err: bs58::decode::Error) -> Self {
        match err {
            bs58::decode::Error::InvalidCharacter { character, index } => TxWireError::InvalidBase58 {
                character,
                position: index,
            },
            other => TxWireError::DecodingError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for TxWireError {
    fn from(err: serde_json::Error) -> Self {
        TxWireError::ReplyError(err.to_string())
    }
}

impl From<base64::DecodeError> for TxWireError {
    fn from(err: base64::DecodeError) -> Self {
        TxWireError::DecodingError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TxWireError>;
