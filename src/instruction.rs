//! Instructions in their expanded and compiled forms
//!
//! Callers describe work as [`Instruction`]s that name accounts by public
//! key. The transaction compiler rewrites them into [`CompiledInstruction`]s
//! that name accounts by position in the message's account table.

use crate::buffer::Buffer;
use crate::error::Result;
use crate::layout::{FieldValue, Layout};
use crate::serialization::{
    compact_len_size, encode_compact_bytes, ByteSerialize, CompactArray,
};
use crate::types::PublicKey;

/// Account reference for an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountRef {
    pub pubkey: PublicKey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountRef {
    pub fn new(pubkey: PublicKey, is_signer: bool, is_writable: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable,
        }
    }

    pub fn new_readonly(pubkey: PublicKey, is_signer: bool) -> Self {
        Self::new(pubkey, is_signer, false)
    }

    pub fn new_writable(pubkey: PublicKey, is_signer: bool) -> Self {
        Self::new(pubkey, is_signer, true)
    }
}

/// An instruction that references its accounts by value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Program ID that this instruction invokes
    pub program_id: PublicKey,
    /// Accounts in the order the program expects them
    pub accounts: Vec<AccountRef>,
    /// Instruction data (opaque bytes)
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: PublicKey, accounts: Vec<AccountRef>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// Anything that can describe itself as a generic [`Instruction`].
pub trait ToInstruction {
    fn to_instruction(&self) -> Instruction;
}

impl ToInstruction for Instruction {
    fn to_instruction(&self) -> Instruction {
        self.clone()
    }
}

/// Builder for hand-assembled instructions
pub struct InstructionEncoder {
    program_id: PublicKey,
    accounts: Vec<AccountRef>,
    data: Buffer,
}

impl InstructionEncoder {
    pub fn new(program_id: PublicKey) -> Self {
        Self {
            program_id,
            accounts: Vec::new(),
            data: Buffer::new(),
        }
    }

    /// Add an account to the instruction
    pub fn account(mut self, account: AccountRef) -> Self {
        self.accounts.push(account);
        self
    }

    /// Add a signer account
    pub fn signer(mut self, pubkey: PublicKey, is_writable: bool) -> Self {
        self.accounts.push(AccountRef::new(pubkey, true, is_writable));
        self
    }

    /// Add a writable account
    pub fn writable(mut self, pubkey: PublicKey, is_signer: bool) -> Self {
        self.accounts.push(AccountRef::new(pubkey, is_signer, true));
        self
    }

    /// Add a readonly, non-signer account
    pub fn readonly(mut self, pubkey: PublicKey) -> Self {
        self.accounts.push(AccountRef::new_readonly(pubkey, false));
        self
    }

    /// Append raw bytes to the instruction data
    pub fn append_data(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    pub fn append_u8(mut self, value: u8) -> Self {
        self.data.push(value);
        self
    }

    /// Append u32 (little-endian) to instruction data
    pub fn append_u32(mut self, value: u32) -> Self {
        self.data.add(value);
        self
    }

    /// Append u64 (little-endian) to instruction data
    pub fn append_u64(mut self, value: u64) -> Self {
        self.data.add(value);
        self
    }

    /// Append a record encoded with `layout`
    pub fn append_layout(mut self, layout: &Layout, values: &[FieldValue]) -> Result<Self> {
        let encoded = layout.encode(values)?;
        self.data.extend_from_slice(&encoded);
        Ok(self)
    }

    pub fn build(self) -> Instruction {
        Instruction::new(self.program_id, self.accounts, self.data.into_vec())
    }
}

/// Instruction with program and accounts resolved to account-table indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: CompactArray<u8>,
    pub data: Vec<u8>,
}

impl CompiledInstruction {
    pub fn new(program_id_index: u8, account_indices: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            program_id_index,
            account_indices: account_indices.into(),
            data,
        }
    }
}

impl ByteSerialize for CompiledInstruction {
    fn serialize_bytes(&self, out: &mut Buffer) -> Result<()> {
        out.push(self.program_id_index);
        self.account_indices.serialize_bytes(out)?;
        encode_compact_bytes(&self.data, out);
        Ok(())
    }

    fn byte_size(&self) -> usize {
        1 + self.account_indices.byte_size() + compact_len_size(self.data.len()) + self.data.len()
    }
}
