//! Transaction compilation and signing
//!
//! [`TransactionBuilder`] collects instructions against a fee payer and a
//! recent block hash, then compiles them into a [`Message`]: accounts are
//! merged and ordered into one table, and every instruction is rewritten to
//! reference that table by index. Signatures are produced over the
//! serialized message and carried into the final [`Transaction`].

use crate::buffer::Buffer;
use crate::config::TransactionEncoding;
use crate::error::{Result, TxWireError};
use crate::instruction::{AccountRef, CompiledInstruction, Instruction, ToInstruction};
use crate::keypair::{self, KeyPair};
use crate::message::{Message, MessageHeader};
use crate::serialization::{ByteSerialize, CompactArray};
use crate::types::{BlockHash, PublicKey, Signature};
use log::*;
use std::collections::HashMap;

/// Largest serialized transaction that fits in one network packet
pub const MAX_TRANSACTION_SIZE: usize = 1232;

/// Account tables are indexed by `u8`.
const MAX_ACCOUNT_KEYS: usize = u8::MAX as usize + 1;

/// Highest version that keeps the versioned-message marker intact
const MAX_MESSAGE_VERSION: u8 = 127;

/// A signed (or partially signed) transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: CompactArray<Signature>,
    pub message: Message,
}

impl Transaction {
    pub fn new(signatures: Vec<Signature>, message: Message) -> Self {
        Self {
            signatures: signatures.into(),
            message,
        }
    }

    /// Wire bytes: compact signature list followed by the message
    pub fn serialize(&self) -> Result<Buffer> {
        self.to_buffer()
    }

    /// The bytes every signature is computed over
    pub fn message_bytes(&self) -> Result<Buffer> {
        self.message.to_buffer()
    }

    /// Calculate transaction size in bytes
    pub fn size(&self) -> usize {
        self.byte_size()
    }

    pub fn exceeds_max_size(&self) -> bool {
        self.size() > MAX_TRANSACTION_SIZE
    }

    pub fn to_base58(&self) -> Result<String> {
        Ok(self.serialize()?.to_base58())
    }

    pub fn to_base64(&self) -> Result<String> {
        Ok(self.serialize()?.to_base64())
    }

    pub fn encode(&self, encoding: TransactionEncoding) -> Result<String> {
        Ok(encoding.encode(&self.serialize()?))
    }

    /// Check signature `i` against account key `i`.
    ///
    /// Returns `Ok(false)` when a signature does not match or when fewer
    /// signatures than required are present.
    pub fn verify_signatures(&self) -> Result<bool> {
        if self.signatures.len() > self.message.account_keys.len() {
            return Err(TxWireError::SignatureError(format!(
                "{} signatures for {} account keys",
                self.signatures.len(),
                self.message.account_keys.len()
            )));
        }
        if self.signatures.len() < self.message.header.num_required_signatures as usize {
            return Ok(false);
        }

        let message = self.message_bytes()?;
        for (signature, key) in self.signatures.iter().zip(self.message.account_keys.iter()) {
            if !keypair::verify(key, signature, &message)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl ByteSerialize for Transaction {
    fn serialize_bytes(&self, out: &mut Buffer) -> Result<()> {
        self.signatures.serialize_bytes(out)?;
        self.message.serialize_bytes(out)
    }

    fn byte_size(&self) -> usize {
        self.signatures.byte_size() + self.message.byte_size()
    }
}

/// Transaction builder with fluent API
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    recent_blockhash: BlockHash,
    fee_payer: PublicKey,
    instructions: Vec<Instruction>,
    version: u8,
    signatures: Vec<Signature>,
    signers: Vec<PublicKey>,
}

impl TransactionBuilder {
    pub fn new(recent_blockhash: BlockHash, fee_payer: PublicKey) -> Self {
        Self {
            recent_blockhash,
            fee_payer,
            instructions: Vec::new(),
            version: 0,
            signatures: Vec::new(),
            signers: Vec::new(),
        }
    }

    /// Add anything that converts into an instruction
    pub fn add(self, instruction: &impl ToInstruction) -> Self {
        self.add_instruction(instruction.to_instruction())
    }

    /// Add an instruction
    pub fn add_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Add multiple instructions
    pub fn add_instructions(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        self.instructions.extend(instructions);
        self
    }

    /// Message version, 0..=127
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn fee_payer(&self) -> PublicKey {
        self.fee_payer
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Public keys of the key pairs that have signed so far, in signing order
    pub fn signers(&self) -> &[PublicKey] {
        &self.signers
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Compile the instructions into a message.
    ///
    /// The account table starts with the fee payer, followed by every other
    /// instruction account (signers first, then writable, then by descending
    /// key), followed by one entry per instruction for its program id.
    pub fn compile_message(&self) -> Result<Message> {
        let accounts = self.ordered_accounts();
        let header = self.header_for(&accounts)?;

        let mut account_keys: Vec<PublicKey> = accounts.iter().map(|account| account.pubkey).collect();
        account_keys.extend(self.instructions.iter().map(|instruction| instruction.program_id));
        if account_keys.len() > MAX_ACCOUNT_KEYS {
            return Err(TxWireError::AccountError(format!(
                "{} account keys, at most {} can be referenced",
                account_keys.len(),
                MAX_ACCOUNT_KEYS
            )));
        }

        let instructions = self
            .instructions
            .iter()
            .map(|instruction| {
                let program_id_index = index_of(&account_keys, &instruction.program_id)?;
                let account_indices = instruction
                    .accounts
                    .iter()
                    .map(|account| index_of(&account_keys, &account.pubkey))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledInstruction::new(
                    program_id_index,
                    account_indices,
                    instruction.data.clone(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "compiled message: {} account keys, {} instructions, {} required signatures",
            account_keys.len(),
            instructions.len(),
            header.num_required_signatures
        );

        Ok(Message::new(header, account_keys, self.recent_blockhash, instructions))
    }

    /// The bytes a signer signs
    pub fn serialize_message(&self) -> Result<Buffer> {
        self.compile_message()?.to_buffer()
    }

    /// Sign the current message and record the signer.
    ///
    /// Adding instructions after signing invalidates earlier signatures.
    pub fn sign(mut self, keypair: &KeyPair) -> Result<Self> {
        let message = self.serialize_message()?;
        let signature = keypair.sign(&message);
        debug!("appended signature {} from {}", signature, keypair.public_key());
        self.signatures.push(signature);
        self.signers.push(keypair.public_key());
        Ok(self)
    }

    /// Compile the message and attach the signatures collected so far.
    pub fn build(self) -> Result<Transaction> {
        let message = self.compile_message()?;
        let transaction = Transaction::new(self.signatures, message);
        if transaction.exceeds_max_size() {
            warn!(
                "transaction is {} bytes, above the {} byte packet limit",
                transaction.size(),
                MAX_TRANSACTION_SIZE
            );
        }
        Ok(transaction)
    }

    /// Fee payer first, then the merged instruction accounts in table order.
    fn ordered_accounts(&self) -> Vec<AccountRef> {
        let mut merged: HashMap<PublicKey, (bool, bool)> = HashMap::new();
        for account in self.instructions.iter().flat_map(|instruction| &instruction.accounts) {
            let entry = merged.entry(account.pubkey).or_insert((false, false));
            entry.0 |= account.is_signer;
            entry.1 |= account.is_writable;
        }
        merged.remove(&self.fee_payer);

        let mut rest: Vec<AccountRef> = merged
            .into_iter()
            .map(|(pubkey, (is_signer, is_writable))| AccountRef::new(pubkey, is_signer, is_writable))
            .collect();
        rest.sort_by(|a, b| {
            b.is_signer
                .cmp(&a.is_signer)
                .then(b.is_writable.cmp(&a.is_writable))
                .then(b.pubkey.cmp(&a.pubkey))
        });

        let mut accounts = Vec::with_capacity(rest.len() + 1);
        accounts.push(AccountRef::new_writable(self.fee_payer, true));
        accounts.extend(rest);
        accounts
    }

    /// Every non-signer counts as readonly unsigned, writable or not.
    fn header_for(&self, accounts: &[AccountRef]) -> Result<MessageHeader> {
        let mut required = 0usize;
        let mut readonly_signed = 0usize;
        let mut readonly_unsigned = 0usize;
        for account in accounts {
            if account.is_signer {
                required += 1;
                if !account.is_writable {
                    readonly_signed += 1;
                }
            } else {
                readonly_unsigned += 1;
            }
        }

        if self.version > MAX_MESSAGE_VERSION {
            warn!(
                "message version {} overflows the version marker byte",
                self.version
            );
        }

        Ok(MessageHeader::new(
            self.version,
            header_count(required, "required signatures")?,
            header_count(readonly_signed, "readonly signed accounts")?,
            header_count(readonly_unsigned, "readonly unsigned accounts")?,
        ))
    }
}

fn header_count(count: usize, what: &str) -> Result<u8> {
    u8::try_from(count).map_err(|_| TxWireError::AccountError(format!("too many {what}: {count}")))
}

/// Position of the first table entry equal to `key`
fn index_of(account_keys: &[PublicKey], key: &PublicKey) -> Result<u8> {
    let position = account_keys.iter().position(|candidate| candidate == key);
    match position.map(u8::try_from) {
        Some(Ok(index)) => Ok(index),
        _ => {
            error!("account {} missing from compiled account table", key);
            Err(TxWireError::InternalConsistency(format!(
                "account {key} is not in the account table"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base58;
    use crate::instruction::InstructionEncoder;
    use crate::system::{Transfer, SYSTEM_PROGRAM_ID};
    use solana_sdk::message::VersionedMessage;
    use solana_sdk::transaction::VersionedTransaction;

    const SECRET: &str =
        "3ffS3Y7v2iVFjpxe83WK6RxzYwCpfbVwvvEyuG52pyrvf6umUiVXUXLWKsHwRUKUtyhP99LfV4ciNYuWx2gRhhKd";
    const RECIPIENT: &str = "5dEU1ec2Dw6C8v1jhtnRN6ZYnnVE54Yn3hJDh4U4fyZJ";
    const BLOCKHASH: &str = "4C76AqhSHrWND8tuqvZ37p62ssdtK4NGsfCm5kMUhNJt";
    const TRANSFER_MESSAGE: &str = "6GhS2ZJZxJoJbYDstaxrESoUWEMqED9cYc8gvsFwomUHGvQCYxQY1bSHNmXHJYNGvtptbbWSEFe3y2XukfuVZxJRLbCa4zq5zrDHK2fr5sP9pgh2bKCqNz5zFvWzty9f3BhgeGwc35SK9XZE58xpTdhoE8aaKJD1o28hfab5yPiwcNJ7ppXykyKGbshoq32E2SBMYYbqiGAcNMHy";
    const TRANSFER_SIGNATURE: &str =
        "a7ZQEsbiAc54G8UPDNTL6X4yVrNtV2JEiHNbcmb49CjiXLL1mcVEqto5sakW6dKmBNcFtcwy733rcub5Eot9PRM";

    fn key(byte: u8) -> PublicKey {
        PublicKey::new([byte; 32])
    }

    fn transfer_builder(signer: &KeyPair) -> TransactionBuilder {
        let transfer = Transfer {
            from: signer.public_key(),
            to: RECIPIENT.parse().unwrap(),
            lamports: 100,
        };
        TransactionBuilder::new(BLOCKHASH.parse().unwrap(), signer.public_key()).add(&transfer)
    }

    #[test]
    fn test_transfer_message_bytes() {
        let signer = KeyPair::from_secret_key(SECRET).unwrap();
        let builder = transfer_builder(&signer);

        let message = builder.compile_message().unwrap();
        let expected = Message::new(
            MessageHeader::new(0, 1, 0, 1),
            vec![signer.public_key(), RECIPIENT.parse().unwrap(), SYSTEM_PROGRAM_ID],
            BLOCKHASH.parse().unwrap(),
            vec![CompiledInstruction::new(
                2,
                vec![0, 1],
                vec![2, 0, 0, 0, 100, 0, 0, 0, 0, 0, 0, 0],
            )],
        );
        assert_eq!(message, expected);
        assert_eq!(builder.serialize_message().unwrap().to_base58(), TRANSFER_MESSAGE);
    }

    #[test]
    fn test_transfer_signature() {
        let signer = KeyPair::from_secret_key(SECRET).unwrap();
        let builder = transfer_builder(&signer).sign(&signer).unwrap();

        assert_eq!(builder.signers(), &[signer.public_key()]);
        assert_eq!(builder.signatures()[0].to_string(), TRANSFER_SIGNATURE);

        let transaction = builder.build().unwrap();
        assert!(transaction.verify_signatures().unwrap());

        let bytes = transaction.serialize().unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..65], transaction.signatures[0].as_bytes());
        assert_eq!(base58::encode(&bytes[65..]), TRANSFER_MESSAGE);
        assert_eq!(transaction.size(), bytes.len());
    }

    #[test]
    fn test_two_account_ordering_and_header() {
        let payer = key(9);
        let program = key(7);
        let writable = key(1);
        let readonly = key(5);

        let instruction = InstructionEncoder::new(program)
            .readonly(readonly)
            .writable(writable, false)
            .append_u8(1)
            .build();
        let message = TransactionBuilder::new(BlockHash::default(), payer)
            .add_instruction(instruction)
            .compile_message()
            .unwrap();

        assert_eq!(&message.account_keys[..], &[payer, writable, readonly, program]);
        assert_eq!(message.header.num_required_signatures, 1);
        assert_eq!(message.header.num_readonly_signed_accounts, 0);
        assert_eq!(message.header.num_readonly_unsigned_accounts, 2);
        assert_eq!(message.instructions[0].program_id_index, 3);
        assert_eq!(&message.instructions[0].account_indices[..], &[2, 1]);
    }

    #[test]
    fn test_duplicate_program_uses_first_entry() {
        let payer = key(9);
        let program = key(7);
        let first = InstructionEncoder::new(program).writable(key(1), false).build();
        let second = InstructionEncoder::new(program).readonly(key(2)).build();

        let message = TransactionBuilder::new(BlockHash::default(), payer)
            .add_instructions([first, second])
            .compile_message()
            .unwrap();

        assert_eq!(&message.account_keys[..], &[payer, key(1), key(2), program, program]);
        assert_eq!(message.instructions[0].program_id_index, 3);
        assert_eq!(message.instructions[1].program_id_index, 3);
    }

    #[test]
    fn test_program_already_in_accounts_resolves_to_account_slot() {
        let payer = key(9);
        let program = key(7);
        let instruction = InstructionEncoder::new(program).readonly(program).build();

        let message = TransactionBuilder::new(BlockHash::default(), payer)
            .add_instruction(instruction)
            .compile_message()
            .unwrap();

        assert_eq!(&message.account_keys[..], &[payer, program, program]);
        assert_eq!(message.instructions[0].program_id_index, 1);
    }

    #[test]
    fn test_flags_merge_across_instructions() {
        let payer = key(9);
        let shared = key(3);
        let first = InstructionEncoder::new(key(7)).readonly(shared).build();
        let second = InstructionEncoder::new(key(8)).signer(shared, true).build();

        let message = TransactionBuilder::new(BlockHash::default(), payer)
            .add_instruction(first)
            .add_instruction(second)
            .compile_message()
            .unwrap();

        assert_eq!(&message.account_keys[..3], &[payer, shared, key(7)]);
        assert_eq!(message.header.num_required_signatures, 2);
        assert_eq!(message.header.num_readonly_signed_accounts, 0);
        assert_eq!(message.instructions[0].account_indices[0], 1);
        assert_eq!(message.instructions[1].account_indices[0], 1);
    }

    #[test]
    fn test_fee_payer_is_lifted_to_slot_zero() {
        let payer = key(1);
        let instruction = InstructionEncoder::new(key(7))
            .writable(key(200), false)
            .readonly(payer)
            .build();

        let message = TransactionBuilder::new(BlockHash::default(), payer)
            .add_instruction(instruction)
            .compile_message()
            .unwrap();

        assert_eq!(message.account_keys[0], payer);
        assert_eq!(message.account_keys.iter().filter(|k| **k == payer).count(), 1);
        assert_eq!(message.header.num_required_signatures, 1);
        assert_eq!(&message.instructions[0].account_indices[..], &[1, 0]);
    }

    #[test]
    fn test_account_ordering() {
        let payer = key(0);
        let instruction = InstructionEncoder::new(key(250))
            .readonly(key(40))
            .readonly(key(90))
            .writable(key(10), false)
            .writable(key(20), false)
            .account(AccountRef::new_readonly(key(30), true))
            .signer(key(5), true)
            .signer(key(6), true)
            .build();

        let message = TransactionBuilder::new(BlockHash::default(), payer)
            .add_instruction(instruction)
            .compile_message()
            .unwrap();

        assert_eq!(
            &message.account_keys[..],
            &[payer, key(6), key(5), key(30), key(20), key(10), key(90), key(40), key(250)]
        );
        assert_eq!(message.header.num_required_signatures, 4);
        assert_eq!(message.header.num_readonly_signed_accounts, 1);
        assert_eq!(message.header.num_readonly_unsigned_accounts, 4);
    }

    #[test]
    fn test_signing_twice_is_identical() {
        let signer = KeyPair::generate();
        let builder = transfer_builder(&signer);
        let message = builder.serialize_message().unwrap();
        assert_eq!(signer.sign(&message), signer.sign(&message));

        let once = builder.clone().sign(&signer).unwrap();
        let twice = builder.sign(&signer).unwrap();
        assert_eq!(once.signatures(), twice.signatures());
    }

    #[test]
    fn test_version_byte() {
        let builder = TransactionBuilder::new(BlockHash::default(), key(1)).version(3);
        let bytes = builder.serialize_message().unwrap();
        assert_eq!(bytes[0], 0x83);
    }

    #[test]
    fn test_too_many_accounts() {
        let mut encoder = InstructionEncoder::new(key(0));
        for i in 0..=255u8 {
            let mut bytes = [i; 32];
            bytes[0] = 1;
            encoder = encoder.readonly(PublicKey::new(bytes));
        }
        let result = TransactionBuilder::new(BlockHash::default(), PublicKey::new([2; 32]))
            .add_instruction(encoder.build())
            .compile_message();
        assert!(matches!(result, Err(TxWireError::AccountError(_))));
    }

    #[test]
    fn test_missing_signature_fails_verification() {
        let signer = KeyPair::generate();
        let transaction = transfer_builder(&signer).build().unwrap();
        assert!(transaction.signatures.is_empty());
        assert!(!transaction.verify_signatures().unwrap());

        let wrong = KeyPair::generate();
        let transaction = transfer_builder(&signer).sign(&wrong).unwrap().build().unwrap();
        assert!(!transaction.verify_signatures().unwrap());
    }

    #[test]
    fn test_oversized_transaction() {
        let instruction = InstructionEncoder::new(key(7)).append_data(&[0; 1300]).build();
        let transaction = TransactionBuilder::new(BlockHash::default(), key(1))
            .add_instruction(instruction)
            .build()
            .unwrap();
        assert!(transaction.exceeds_max_size());
    }

    #[test]
    fn test_text_encodings() {
        let signer = KeyPair::from_secret_key(SECRET).unwrap();
        let transaction = transfer_builder(&signer).sign(&signer).unwrap().build().unwrap();
        let bytes = transaction.serialize().unwrap();

        assert_eq!(transaction.to_base58().unwrap(), bs58::encode(bytes.as_slice()).into_string());
        assert_eq!(
            transaction.encode(TransactionEncoding::Base64).unwrap(),
            transaction.to_base64().unwrap()
        );
        assert_eq!(Buffer::from_base64(&transaction.to_base64().unwrap()).unwrap(), bytes);
    }

    #[test]
    fn test_wire_bytes_decode_as_versioned_transaction() {
        let signer = KeyPair::from_secret_key(SECRET).unwrap();
        let transaction = transfer_builder(&signer).sign(&signer).unwrap().build().unwrap();
        let bytes = transaction.serialize().unwrap();

        let decoded: VersionedTransaction = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.signatures.len(), 1);
        assert_eq!(Signature::from(decoded.signatures[0]), transaction.signatures[0]);

        let message_bytes = decoded.message.serialize();
        assert_eq!(message_bytes, transaction.message_bytes().unwrap().into_vec());
        assert!(decoded.signatures[0].verify(&signer.public_key().to_bytes(), &message_bytes));

        let VersionedMessage::V0(message) = decoded.message else {
            panic!("expected a v0 message");
        };
        assert_eq!(message.header.num_required_signatures, 1);
        assert_eq!(message.header.num_readonly_signed_accounts, 0);
        assert_eq!(message.header.num_readonly_unsigned_accounts, 1);
        assert_eq!(PublicKey::from(message.account_keys[0]), signer.public_key());
        assert_eq!(PublicKey::from(message.account_keys[2]), SYSTEM_PROGRAM_ID);
        assert_eq!(BlockHash::from(message.recent_blockhash).to_string(), BLOCKHASH);
        assert_eq!(message.instructions[0].program_id_index, 2);
        assert_eq!(message.instructions[0].accounts, vec![0, 1]);
        assert!(message.address_table_lookups.is_empty());
    }
}
