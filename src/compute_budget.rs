//! Compute budget instructions (priority fees)

use crate::instruction::{Instruction, InstructionEncoder, ToInstruction};
use crate::types::PublicKey;

/// `ComputeBudget111111111111111111111111111111`
pub const COMPUTE_BUDGET_PROGRAM_ID: PublicKey = PublicKey::new([
    0x03, 0x06, 0x46, 0x6f, 0xe5, 0x21, 0x17, 0x32,
    0xff, 0xec, 0xad, 0xba, 0x72, 0xc3, 0x9b, 0xe7,
    0xbc, 0x8c, 0xe5, 0xbb, 0xc5, 0xf7, 0x12, 0x6b,
    0x2c, 0x43, 0x9b, 0x3a, 0x40, 0x00, 0x00, 0x00,
]);

const SET_COMPUTE_UNIT_LIMIT: u8 = 0x02;
const SET_COMPUTE_UNIT_PRICE: u8 = 0x03;

const MICRO_LAMPORTS_PER_LAMPORT: u128 = 1_000_000;

/// Cap the compute units the transaction may consume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetComputeUnitLimit(pub u32);

impl ToInstruction for SetComputeUnitLimit {
    fn to_instruction(&self) -> Instruction {
        InstructionEncoder::new(COMPUTE_BUDGET_PROGRAM_ID)
            .append_u8(SET_COMPUTE_UNIT_LIMIT)
            .append_u32(self.0)
            .build()
    }
}

/// Priority fee in micro-lamports per compute unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetComputeUnitPrice(pub u64);

impl ToInstruction for SetComputeUnitPrice {
    fn to_instruction(&self) -> Instruction {
        InstructionEncoder::new(COMPUTE_BUDGET_PROGRAM_ID)
            .append_u8(SET_COMPUTE_UNIT_PRICE)
            .append_u64(self.0)
            .build()
    }
}

/// Lamports charged for `units` at `micro_lamports` per unit, rounded up
pub fn priority_fee_lamports(units: u32, micro_lamports: u64) -> u64 {
    let micro = units as u128 * micro_lamports as u128;
    let lamports = micro.div_ceil(MICRO_LAMPORTS_PER_LAMPORT);
    u64::try_from(lamports).unwrap_or(u64::MAX)
}
