//! System program instructions

use crate::error::{Result, TxWireError};
use crate::instruction::{Instruction, InstructionEncoder, ToInstruction};
use crate::layout::{FieldKind, FieldReader, FieldValue, Layout, LayoutRecord};
use crate::types::PublicKey;
use log::error;

/// `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: PublicKey = PublicKey::new([0; 32]);

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const TRANSFER_INDEX: u32 = 2;
const ALLOCATE_INDEX: u32 = 8;

/// Convert SOL to lamports, truncating fractions of a lamport
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64) as u64
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Move lamports from a signing account to another account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: PublicKey,
    pub to: PublicKey,
    pub lamports: u64,
}

impl ToInstruction for Transfer {
    fn to_instruction(&self) -> Instruction {
        InstructionEncoder::new(SYSTEM_PROGRAM_ID)
            .signer(self.from, true)
            .writable(self.to, false)
            .append_data(&encode_data(&TransferData {
                index: TRANSFER_INDEX,
                lamports: self.lamports,
            }))
            .build()
    }
}

/// Reserve `space` bytes of data in a signing account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocate {
    pub account: PublicKey,
    pub space: u64,
}

impl ToInstruction for Allocate {
    fn to_instruction(&self) -> Instruction {
        InstructionEncoder::new(SYSTEM_PROGRAM_ID)
            .signer(self.account, true)
            .append_data(&encode_data(&AllocateData {
                index: ALLOCATE_INDEX,
                space: self.space,
            }))
            .build()
    }
}

/// Encode a fixed integer record. Such records have no input that fails to
/// encode, so a failure here is logged and yields empty data.
fn encode_data(record: &impl LayoutRecord) -> Vec<u8> {
    match record.encode() {
        Ok(data) => data.into_vec(),
        Err(err) => {
            error!("system instruction data failed to encode: {}", err);
            Vec::new()
        }
    }
}

/// Instruction data of a transfer: `u32` index then `u64` lamports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferData {
    pub index: u32,
    pub lamports: u64,
}

impl LayoutRecord for TransferData {
    fn layout() -> Result<Layout> {
        Layout::new([("index", FieldKind::U32), ("lamports", FieldKind::U64)])
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![self.index.into(), self.lamports.into()]
    }

    fn from_fields(fields: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            index: fields.read()?,
            lamports: fields.read()?,
        })
    }
}

/// Instruction data of an allocation: `u32` index then `u64` space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocateData {
    pub index: u32,
    pub space: u64,
}

impl LayoutRecord for AllocateData {
    fn layout() -> Result<Layout> {
        Layout::new([("index", FieldKind::U32), ("space", FieldKind::U64)])
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![self.index.into(), self.space.into()]
    }

    fn from_fields(fields: &mut FieldReader) -> Result<Self> {
        Ok(Self {
            index: fields.read()?,
            space: fields.read()?,
        })
    }
}

/// Decoded system instruction data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemInstruction {
    Transfer { lamports: u64 },
    Allocate { space: u64 },
}

impl SystemInstruction {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let index = data
            .get(..4)
            .and_then(|bytes| bytes.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(TxWireError::BufferTooSmall {
                needed: 4,
                available: data.len(),
            })?;

        match index {
            TRANSFER_INDEX => Ok(Self::Transfer {
                lamports: TransferData::decode(data)?.lamports,
            }),
            ALLOCATE_INDEX => Ok(Self::Allocate {
                space: AllocateData::decode(data)?.space,
            }),
            other => Err(TxWireError::InvalidInstruction(format!(
                "unsupported system instruction index {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::AccountRef;

    #[test]
    fn test_program_id_text() {
        assert_eq!(SYSTEM_PROGRAM_ID.to_string(), "11111111111111111111111111111111");
        assert_eq!(
            solana_sdk::pubkey::Pubkey::from(SYSTEM_PROGRAM_ID),
            solana_sdk::system_program::id()
        );
    }

    #[test]
    fn test_transfer_instruction() {
        let from = PublicKey::new([1; 32]);
        let to = PublicKey::new([2; 32]);
        let instruction = Transfer { from, to, lamports: 100 }.to_instruction();

        assert_eq!(instruction.program_id, SYSTEM_PROGRAM_ID);
        assert_eq!(
            instruction.accounts,
            vec![AccountRef::new(from, true, true), AccountRef::new(to, false, true)]
        );
        assert_eq!(instruction.data, hex::decode("020000006400000000000000").unwrap());

        let data = TransferData::decode(&instruction.data).unwrap();
        assert_eq!(data, TransferData { index: 2, lamports: 100 });
        assert_eq!(TransferData::space().unwrap(), 12);
        assert_eq!(data.encode().unwrap().into_vec(), instruction.data);
    }

    #[test]
    fn test_matches_sdk_system_instructions() {
        let from = solana_sdk::pubkey::Pubkey::new_unique();
        let to = solana_sdk::pubkey::Pubkey::new_unique();

        let ours = Transfer {
            from: from.into(),
            to: to.into(),
            lamports: 42,
        }
        .to_instruction();
        let theirs = solana_sdk::system_instruction::transfer(&from, &to, 42);
        assert_eq!(ours.data, theirs.data);

        let ours = Allocate {
            account: from.into(),
            space: 165,
        }
        .to_instruction();
        let theirs = solana_sdk::system_instruction::allocate(&from, 165);
        assert_eq!(ours.data, theirs.data);
        assert_eq!(ours.accounts, vec![AccountRef::new(from.into(), true, true)]);
    }

    #[test]
    fn test_decode_system_instruction() {
        let allocate = Allocate {
            account: PublicKey::new([3; 32]),
            space: 1024,
        }
        .to_instruction();
        assert_eq!(
            SystemInstruction::decode(&allocate.data).unwrap(),
            SystemInstruction::Allocate { space: 1024 }
        );

        assert!(matches!(
            SystemInstruction::decode(&[9, 0, 0, 0]),
            Err(TxWireError::InvalidInstruction(_))
        ));
        assert!(matches!(
            SystemInstruction::decode(&[2, 0]),
            Err(TxWireError::BufferTooSmall { needed: 4, available: 2 })
        ));
    }

    #[test]
    fn test_instruction_data_follows_record_layouts() {
        let key = PublicKey::new([4; 32]);
        for lamports in [0, 1, u64::MAX] {
            let data = Transfer { from: key, to: key, lamports }.to_instruction().data;
            assert_eq!(data.len(), TransferData::space().unwrap());
            assert_eq!(
                TransferData::decode(&data).unwrap(),
                TransferData { index: TRANSFER_INDEX, lamports }
            );
        }

        let data = Allocate { account: key, space: 10_240 }.to_instruction().data;
        assert_eq!(data.len(), AllocateData::space().unwrap());
        assert_eq!(
            data,
            AllocateData { index: ALLOCATE_INDEX, space: 10_240 }.encode().unwrap().into_vec()
        );
    }

    #[test]
    fn test_sol_conversion() {
        assert_eq!(sol_to_lamports(1.0), LAMPORTS_PER_SOL);
        assert_eq!(sol_to_lamports(0.5), 500_000_000);
        assert_eq!(lamports_to_sol(2_500_000_000), 2.5);
    }
}
