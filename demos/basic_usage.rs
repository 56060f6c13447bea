//! Basic usage examples for TxWire

use serde_json::json;
use txwire::compute_budget::priority_fee_lamports;
use txwire::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== TxWire Basic Usage Examples ===\n");

    // Example 1: A signed SOL transfer
    example_transfer()?;

    // Example 2: Hand-assembled instruction with a layout
    example_instruction_encoder()?;

    // Example 3: Priority fees
    example_priority_fee()?;

    // Example 4: Submitting through a transport
    example_rpc()?;

    Ok(())
}

fn example_transfer() -> Result<(), Box<dyn std::error::Error>> {
    println!("Example 1: Building a Signed Transfer");
    println!("-------------------------------------");

    let payer = KeyPair::generate();
    let recipient = KeyPair::generate().public_key();
    let recent_blockhash = BlockHash::new([7; 32]);

    let transaction = TransactionBuilder::new(recent_blockhash, payer.public_key())
        .add(&Transfer {
            from: payer.public_key(),
            to: recipient,
            lamports: sol_to_lamports(0.25),
        })
        .sign(&payer)?
        .build()?;

    println!("✓ Transaction created");
    println!("  Size: {} bytes", transaction.size());
    println!("  Accounts: {}", transaction.message.account_keys.len());
    println!("  Signature: {}", transaction.signatures[0]);
    println!("  Signatures valid: {}", transaction.verify_signatures()?);
    println!("  Base58: {}", transaction.to_base58()?);
    println!();

    Ok(())
}

fn example_instruction_encoder() -> Result<(), Box<dyn std::error::Error>> {
    println!("Example 2: Using Instruction Encoder");
    println!("------------------------------------");

    let program_id = KeyPair::generate().public_key();
    let authority = KeyPair::generate().public_key();
    let vault = KeyPair::generate().public_key();

    let layout = Layout::new([
        ("amount", FieldKind::U64),
        ("memo", FieldKind::optional(FieldKind::U32)),
    ])?;

    let instruction = InstructionEncoder::new(program_id)
        .signer(authority, false)
        .writable(vault, false)
        .append_u8(5) // Instruction type
        .append_layout(&layout, &[1_000_000u64.into(), Some(42u32).into()])?
        .build();

    println!("✓ Instruction created");
    println!("  Program ID: {}", program_id);
    println!("  Accounts: {}", instruction.accounts.len());
    println!("  Data size: {} bytes (layout space {})", instruction.data.len(), layout.space()?);
    println!("  Decoded: {:?}", layout.decode(&instruction.data[1..])?);
    println!();

    Ok(())
}

fn example_priority_fee() -> Result<(), Box<dyn std::error::Error>> {
    println!("Example 3: Priority Fees");
    println!("------------------------");

    let payer = KeyPair::generate();
    let units = 200_000;
    let micro_lamports = 10_000;

    let transaction = TransactionBuilder::new(BlockHash::default(), payer.public_key())
        .add(&SetComputeUnitLimit(units))
        .add(&SetComputeUnitPrice(micro_lamports))
        .add(&Allocate {
            account: payer.public_key(),
            space: 128,
        })
        .sign(&payer)?
        .build()?;

    println!("  Instructions: {}", transaction.message.instructions.len());
    println!("  Priority fee: {} lamports", priority_fee_lamports(units, micro_lamports));
    println!("  Fits in one packet: {}", !transaction.exceeds_max_size());
    println!();

    Ok(())
}

fn example_rpc() -> Result<(), Box<dyn std::error::Error>> {
    println!("Example 4: RPC Over an Offline Transport");
    println!("----------------------------------------");

    // Answers like a node would, without touching the network.
    let transport = JsonRpcTransport::new(|body: &str| -> txwire::Result<String> {
        let request: serde_json::Value = serde_json::from_str(body)?;
        let result = match request["method"].as_str() {
            Some("getLatestBlockhash") => json!({
                "context": {"slot": 1},
                "value": {
                    "blockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N",
                    "lastValidBlockHeight": 3090
                }
            }),
            Some("sendTransaction") => {
                let wire = request["params"][0].as_str().unwrap_or_default();
                let bytes = TransactionEncoding::Base64.decode(wire)?;
                json!(txwire::base58::encode(&bytes[1..65]))
            }
            _ => return Ok(json!({"jsonrpc": "2.0", "id": request["id"], "error": {"code": -32601, "message": "Method not found"}}).to_string()),
        };
        Ok(json!({"jsonrpc": "2.0", "id": request["id"], "result": result}).to_string())
    });

    let client = RpcClient::new(transport, ClientConfig::default());
    let latest = client.get_latest_blockhash()?;
    println!("  Latest blockhash: {}", latest.blockhash);

    let payer = KeyPair::generate();
    let transaction = TransactionBuilder::new(latest.blockhash, payer.public_key())
        .add(&Transfer {
            from: payer.public_key(),
            to: KeyPair::generate().public_key(),
            lamports: 5_000,
        })
        .sign(&payer)?
        .build()?;

    let signature = client.send_transaction(&transaction)?;
    println!("  Submitted: {}", signature);

    match client.get_balance(&payer.public_key()) {
        Err(TxWireError::Rpc { code, message }) => println!("  Node refused getBalance: {} {}", code, message),
        other => println!("  Unexpected: {:?}", other),
    }
    println!();

    Ok(())
}
