//! Client configuration
//!
//! Everything is optional in the JSON form; missing fields fall back to the
//! defaults below.

use crate::base58;
use crate::error::{Result, TxWireError};
use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// How settled a block must be before a query observes it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    #[default]
    Finalized,
}

/// Text form used to ship wire bytes to a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionEncoding {
    Base58,
    #[default]
    Base64,
}

impl TransactionEncoding {
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Base58 => base58::encode(bytes),
            Self::Base64 => BASE64_STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Base58 => base58::decode(text),
            Self::Base64 => Ok(BASE64_STANDARD.decode(text)?),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base58 => "base58",
            Self::Base64 => "base64",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub commitment: Commitment,
    pub encoding: TransactionEncoding,
    pub skip_preflight: bool,
    pub max_retries: Option<u32>,
    pub min_context_slot: Option<u64>,
}

impl ClientConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| TxWireError::ConfigError(format!("invalid client config: {e}")))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path).map_err(|e| {
            TxWireError::ConfigError(format!("failed to read {:?}: {e}", path.as_ref()))
        })?;
        Self::from_json_str(&text)
    }

    /// `{ commitment, minContextSlot? }` as carried by read queries
    pub fn query_options(&self) -> Value {
        let mut options = Map::new();
        options.insert("commitment".to_string(), json!(self.commitment));
        if let Some(slot) = self.min_context_slot {
            options.insert("minContextSlot".to_string(), json!(slot));
        }
        Value::Object(options)
    }

    /// Options object of a `sendTransaction` call
    pub fn send_options(&self) -> Value {
        let mut options = Map::new();
        options.insert("encoding".to_string(), json!(self.encoding));
        options.insert("skipPreflight".to_string(), json!(self.skip_preflight));
        options.insert("preflightCommitment".to_string(), json!(self.commitment));
        if let Some(retries) = self.max_retries {
            options.insert("maxRetries".to_string(), json!(retries));
        }
        if let Some(slot) = self.min_context_slot {
            options.insert("minContextSlot".to_string(), json!(slot));
        }
        Value::Object(options)
    }
}
