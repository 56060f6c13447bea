//! Fixed-width identifiers: public keys, private keys, signatures, block hashes

use crate::base58;
use crate::buffer::Buffer;
use crate::error::{Result, TxWireError};
use crate::serialization::ByteSerialize;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const PUBKEY_BYTES: usize = 32;
pub const SIGNATURE_BYTES: usize = 64;
pub const HASH_BYTES: usize = 32;

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn to_bytes(&self) -> [u8; $len] {
                self.0
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_base58(&self) -> String {
                base58::encode(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = TxWireError;

            fn try_from(bytes: &[u8]) -> Result<Self> {
                let array: [u8; $len] = bytes.try_into().map_err(|_| {
                    TxWireError::DecodingError(format!(
                        "{} needs {} bytes, got {}",
                        stringify!($name),
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok(Self(array))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = TxWireError;

            fn from_str(text: &str) -> Result<Self> {
                Ok(Self(base58::decode_array::<$len>(text)?))
            }
        }

        /// Raw bytes, no length prefix.
        impl ByteSerialize for $name {
            fn serialize_bytes(&self, out: &mut Buffer) -> Result<()> {
                out.extend_from_slice(&self.0);
                Ok(())
            }

            fn byte_size(&self) -> usize {
                $len
            }
        }
    };
}

macro_rules! base58_text {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_base58())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_base58())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base58())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// A 32-byte account address. Orders by raw byte value.
    PublicKey,
    PUBKEY_BYTES
);
base58_text!(PublicKey);

fixed_bytes!(
    /// The private Ed25519 scalar seed.
    PrivateKey,
    32
);

fixed_bytes!(
    /// A 64-byte Ed25519 signature.
    Signature,
    SIGNATURE_BYTES
);
base58_text!(Signature);

fixed_bytes!(
    /// Recent block hash bound into a message.
    BlockHash,
    HASH_BYTES
);
base58_text!(BlockHash);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl From<solana_sdk::pubkey::Pubkey> for PublicKey {
    fn from(pubkey: solana_sdk::pubkey::Pubkey) -> Self {
        Self(pubkey.to_bytes())
    }
}

impl From<PublicKey> for solana_sdk::pubkey::Pubkey {
    fn from(pubkey: PublicKey) -> Self {
        solana_sdk::pubkey::Pubkey::new_from_array(pubkey.0)
    }
}

impl From<solana_sdk::hash::Hash> for BlockHash {
    fn from(hash: solana_sdk::hash::Hash) -> Self {
        Self(hash.to_bytes())
    }
}

impl From<BlockHash> for solana_sdk::hash::Hash {
    fn from(hash: BlockHash) -> Self {
        solana_sdk::hash::Hash::new_from_array(hash.0)
    }
}

impl From<solana_sdk::signature::Signature> for Signature {
    fn from(signature: solana_sdk::signature::Signature) -> Self {
        let mut bytes = [0u8; SIGNATURE_BYTES];
        bytes.copy_from_slice(signature.as_ref());
        Self(bytes)
    }
}

impl From<Signature> for solana_sdk::signature::Signature {
    fn from(signature: Signature) -> Self {
        solana_sdk::signature::Signature::from(signature.0)
    }
}
