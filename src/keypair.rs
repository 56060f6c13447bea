//! Ed25519 key pairs and message signing
//!
//! Signing and verification run on `solana-sdk`'s Ed25519 keypair. Secret
//! keys travel as base58 text of 64 bytes: the 32-byte private seed followed
//! by the 32-byte public key.

use crate::base58;
use crate::error::{Result, TxWireError};
use crate::types::{PrivateKey, PublicKey, Signature};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair as SdkKeypair, Signer};
use solana_sdk::signer::keypair::keypair_from_seed;
use std::fmt;

pub const SECRET_KEY_BYTES: usize = 64;

/// An immutable public/private key pair.
pub struct KeyPair {
    inner: SdkKeypair,
    public_key: PublicKey,
    private_key: PrivateKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS RNG
    pub fn generate() -> Self {
        Self::wrap(SdkKeypair::new())
    }

    /// Parse a base58 secret key (private seed ++ public key).
    pub fn from_secret_key(secret: &str) -> Result<Self> {
        let bytes = base58::decode(secret).map_err(|e| TxWireError::InvalidSecretKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Build from 64 raw bytes; the public half must match the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_BYTES {
            return Err(TxWireError::InvalidSecretKey(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_BYTES,
                bytes.len()
            )));
        }

        let inner = keypair_from_seed(&bytes[..32])
            .map_err(|e| TxWireError::InvalidSecretKey(e.to_string()))?;
        if inner.pubkey().to_bytes()[..] != bytes[32..] {
            return Err(TxWireError::InvalidSecretKey(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(Self::wrap(inner))
    }

    fn wrap(inner: SdkKeypair) -> Self {
        let bytes = inner.to_bytes();
        let mut private = [0u8; 32];
        private.copy_from_slice(&bytes[..32]);
        Self {
            public_key: PublicKey::from(inner.pubkey()),
            private_key: PrivateKey::new(private),
            inner,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The 64-byte secret key as base58 text
    pub fn to_base58_string(&self) -> String {
        base58::encode(&self.inner.to_bytes())
    }

    /// Deterministic Ed25519 signature over `message`
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from(self.inner.sign_message(message))
    }

    pub fn verify(&self, signature: &Signature, message: &[u8]) -> Result<bool> {
        verify(&self.public_key, signature, message)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Check `signature` over `message` against `public_key`.
///
/// `Ok(false)` means the signature does not match. A key that is not a
/// valid curve point cannot verify anything and is reported as
/// [`TxWireError::CryptoError`].
pub fn verify(public_key: &PublicKey, signature: &Signature, message: &[u8]) -> Result<bool> {
    let pubkey = Pubkey::from(*public_key);
    if !pubkey.is_on_curve() {
        return Err(TxWireError::CryptoError(format!(
            "{public_key} is not an Ed25519 curve point"
        )));
    }
    let signature = solana_sdk::signature::Signature::from(*signature);
    Ok(signature.verify(pubkey.as_ref(), message))
}
