//! Compiled message: header, account table, block hash, instructions

use crate::buffer::Buffer;
use crate::error::Result;
use crate::instruction::CompiledInstruction;
use crate::serialization::{ByteSerialize, CompactArray};
use crate::types::{BlockHash, PublicKey};

/// High bit of the first message byte: set for versioned messages.
pub const VERSION_PREFIX: u8 = 0x80;

/// Message header containing account metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Versioned-message marker plus version number
    pub version: u8,
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

impl MessageHeader {
    /// `version` is added onto the marker bit, so only 0..=127 keeps the
    /// marker intact.
    pub fn new(
        version: u8,
        num_required_signatures: u8,
        num_readonly_signed_accounts: u8,
        num_readonly_unsigned_accounts: u8,
    ) -> Self {
        Self {
            version: VERSION_PREFIX.wrapping_add(version),
            num_required_signatures,
            num_readonly_signed_accounts,
            num_readonly_unsigned_accounts,
        }
    }

    pub fn is_versioned(&self) -> bool {
        self.version & VERSION_PREFIX != 0
    }

    pub fn version_number(&self) -> u8 {
        self.version & !VERSION_PREFIX
    }
}

impl Default for MessageHeader {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl ByteSerialize for MessageHeader {
    fn serialize_bytes(&self, out: &mut Buffer) -> Result<()> {
        out.push(self.version);
        out.push(self.num_required_signatures);
        out.push(self.num_readonly_signed_accounts);
        out.push(self.num_readonly_unsigned_accounts);
        Ok(())
    }

    fn byte_size(&self) -> usize {
        4
    }
}

/// Reserved for lookup-table support; the compiler never emits one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTableLookup {
    pub account_key: PublicKey,
    pub writable_indexes: CompactArray<u8>,
    pub readonly_indexes: CompactArray<u8>,
}

impl ByteSerialize for AddressTableLookup {
    fn serialize_bytes(&self, out: &mut Buffer) -> Result<()> {
        self.account_key.serialize_bytes(out)?;
        self.writable_indexes.serialize_bytes(out)?;
        self.readonly_indexes.serialize_bytes(out)
    }

    fn byte_size(&self) -> usize {
        32 + self.writable_indexes.byte_size() + self.readonly_indexes.byte_size()
    }
}

/// Compiled message ready for signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: CompactArray<PublicKey>,
    pub recent_blockhash: BlockHash,
    pub instructions: CompactArray<CompiledInstruction>,
    pub address_table_lookups: CompactArray<AddressTableLookup>,
}

impl Message {
    pub fn new(
        header: MessageHeader,
        account_keys: Vec<PublicKey>,
        recent_blockhash: BlockHash,
        instructions: Vec<CompiledInstruction>,
    ) -> Self {
        Self {
            header,
            account_keys: account_keys.into(),
            recent_blockhash,
            instructions: instructions.into(),
            address_table_lookups: CompactArray::new(),
        }
    }

    /// Account keys that must sign, in table order
    pub fn signer_keys(&self) -> &[PublicKey] {
        let required = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..required]
    }
}

impl ByteSerialize for Message {
    fn serialize_bytes(&self, out: &mut Buffer) -> Result<()> {
        self.header.serialize_bytes(out)?;
        self.account_keys.serialize_bytes(out)?;
        self.recent_blockhash.serialize_bytes(out)?;
        self.instructions.serialize_bytes(out)?;
        self.address_table_lookups.serialize_bytes(out)
    }

    fn byte_size(&self) -> usize {
        self.header.byte_size()
            + self.account_keys.byte_size()
            + self.recent_blockhash.byte_size()
            + self.instructions.byte_size()
            + self.address_table_lookups.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_header() {
        let header = MessageHeader::new(0, 3, 2, 1);
        assert_eq!(header.to_buffer().unwrap().as_slice(), &[0x80, 3, 2, 1]);
        assert!(header.is_versioned());
        assert_eq!(header.version_number(), 0);
    }

    #[test]
    fn test_version_is_added_to_marker() {
        assert_eq!(MessageHeader::new(5, 0, 0, 0).version, 0x85);
        // 128 overflows into the marker bit.
        let overflowed = MessageHeader::new(128, 0, 0, 0);
        assert_eq!(overflowed.version, 0x00);
        assert!(!overflowed.is_versioned());
    }

    #[test]
    fn test_compact_array_of_keys() {
        let first = PublicKey::new([
            2, 32, 45, 56, 34, 64, 64, 34, 34, 35, 34, 65, 57, 34, 45, 34, 45, 64, 34, 43, 34, 34,
            34, 43, 43, 43, 34, 56, 56, 56, 45, 98,
        ]);
        let mut second_bytes = first.to_bytes();
        second_bytes[22] = 74;
        let keys: CompactArray<PublicKey> = vec![first, PublicKey::new(second_bytes)].into();

        let bytes = keys.to_buffer().unwrap();
        assert_eq!(bytes.len(), 1 + 64);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..33], first.as_bytes());
        assert_eq!(&bytes[33..], &second_bytes);
    }

    #[test]
    fn test_message_layout() {
        let message = Message::new(
            MessageHeader::new(0, 1, 0, 1),
            vec![PublicKey::new([1; 32]), PublicKey::new([2; 32])],
            BlockHash::new([9; 32]),
            vec![CompiledInstruction::new(1, vec![0], vec![5])],
        );
        let bytes = message.to_buffer().unwrap();

        assert_eq!(&bytes[..4], &[0x80, 1, 0, 1]);
        assert_eq!(bytes[4], 2);
        assert_eq!(&bytes[69..101], &[9; 32]);
        assert_eq!(&bytes[101..], &[1, 1, 1, 0, 1, 5, 0]);
        assert_eq!(message.byte_size(), bytes.len());
        assert_eq!(message.signer_keys(), &[PublicKey::new([1; 32])]);
    }

    #[test]
    fn test_lookup_entry_encoding() {
        let lookup = AddressTableLookup {
            account_key: PublicKey::new([4; 32]),
            writable_indexes: vec![1, 2].into(),
            readonly_indexes: CompactArray::new(),
        };
        let bytes = lookup.to_buffer().unwrap();
        assert_eq!(&bytes[32..], &[2, 1, 2, 0]);
        assert_eq!(lookup.byte_size(), bytes.len());
    }
}
