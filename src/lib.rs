//! TxWire - Solana transaction construction at the byte level
//!
//! Builds versioned transaction messages from high-level instructions,
//! signs them with Ed25519 key pairs and serializes them to the exact wire
//! format a node accepts. A small layout codec describes fixed-schema
//! account and instruction data, and a transport-agnostic RPC client ships
//! the result.

pub mod base58;
pub mod buffer;
pub mod compute_budget;
pub mod config;
pub mod error;
pub mod instruction;
pub mod keypair;
pub mod layout;
pub mod message;
pub mod rpc;
pub mod serialization;
pub mod system;
pub mod transaction;
pub mod types;

pub use buffer::Buffer;
pub use config::{ClientConfig, Commitment, TransactionEncoding};
pub use error::{Result, TxWireError};
pub use instruction::{AccountRef, CompiledInstruction, Instruction, InstructionEncoder, ToInstruction};
pub use keypair::KeyPair;
pub use layout::{FieldKind, FieldReader, FieldValue, Layout, LayoutRecord};
pub use message::{Message, MessageHeader};
pub use rpc::{RpcClient, Transport};
pub use transaction::{Transaction, TransactionBuilder, MAX_TRANSACTION_SIZE};
pub use types::{BlockHash, PrivateKey, PublicKey, Signature};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buffer::Buffer;
    pub use crate::compute_budget::{SetComputeUnitLimit, SetComputeUnitPrice};
    pub use crate::config::{ClientConfig, TransactionEncoding};
    pub use crate::error::TxWireError;
    pub use crate::instruction::{AccountRef, Instruction, InstructionEncoder, ToInstruction};
    pub use crate::keypair::KeyPair;
    pub use crate::layout::{FieldKind, FieldReader, FieldValue, Layout, LayoutRecord};
    pub use crate::rpc::{JsonRpcTransport, RpcClient, Transport};
    pub use crate::serialization::ByteSerialize;
    pub use crate::system::{sol_to_lamports, Allocate, Transfer, LAMPORTS_PER_SOL};
    pub use crate::transaction::{Transaction, TransactionBuilder};
    pub use crate::types::{BlockHash, PublicKey, Signature};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_library_imports() {
        let payer = KeyPair::generate();
        let transaction = TransactionBuilder::new(BlockHash::default(), payer.public_key())
            .add(&SetComputeUnitPrice(1))
            .add(&Transfer {
                from: payer.public_key(),
                to: PublicKey::new([3; 32]),
                lamports: sol_to_lamports(0.001),
            })
            .sign(&payer)
            .unwrap()
            .build()
            .unwrap();
        assert!(transaction.verify_signatures().unwrap());
    }
}
