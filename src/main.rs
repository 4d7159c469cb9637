use anyhow::Result;
use pow_ledger::blockchain::Blockchain;
use serde_json::json;

// Walks through the full lifecycle: genesis, pooled transactions, a custom
// data block, and full-chain validation.
fn main() -> Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Create a blockchain requiring 3 leading zero hex digits per hash
    let blockchain = Blockchain::new(3);

    println!("\n=== Blockchain initialized with genesis block ===");
    blockchain.print_chain();

    // Add some transactions to the pending pool
    blockchain.add_transaction(json!({"from": "Alice", "to": "Bob", "amount": 10}))?;
    blockchain.add_transaction(json!({"from": "Bob", "to": "Charlie", "amount": 5}))?;

    // Mine the pending transactions into a new block
    println!("\n=== Appending block with pending transactions ===");
    blockchain.append_block()?;
    blockchain.print_chain();

    // Append a block with a direct payload, bypassing the pool
    println!("\n=== Appending block with direct data ===");
    blockchain.append_block_with_data(json!({"message": "Block with direct data"}))?;
    blockchain.print_chain();

    // Verify the whole chain
    println!("\n=== Validating the chain ===");
    let is_valid = blockchain.is_chain_valid();
    println!(
        "Is the blockchain valid? {}",
        if is_valid { "Yes" } else { "No" }
    );

    Ok(())
}
