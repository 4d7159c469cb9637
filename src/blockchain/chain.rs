use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use super::block::{Block, BlockBuilder, BlockData};
use super::pow::{self, MineOutcome};
use super::transaction::{Transaction, TransactionError};

/// Previous-hash sentinel carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Mining gave up after {attempts} attempts at difficulty {difficulty}")]
    MiningExhausted { attempts: u64, difficulty: usize },
}

/// First violation found while validating a chain
///
/// `index` is the position of the failing block in the chain, which equals its
/// stored index on any chain this system produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block {index}: stored hash does not match its recomputed hash")]
    HashMismatch { index: u64 },

    #[error("block {index}: previous_hash does not match the hash of its predecessor")]
    BrokenLink { index: u64 },

    #[error("block {index}: hash does not meet difficulty {difficulty}")]
    InsufficientWork { index: u64, difficulty: usize },
}

/// Represents the blockchain
///
/// Owns the ordered sequence of blocks and the pending transaction pool. Both
/// live behind per-instance mutexes, so the mutation surface is serialized;
/// mining itself is a sequential CPU-bound loop owned by the appending caller.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, append-only after genesis
    chain: Arc<Mutex<Vec<Block>>>,

    /// Pending transactions to be included in the next block
    pending_transactions: Arc<Mutex<Vec<Transaction>>>,

    /// Mining difficulty (number of leading zero hex digits required in a hash)
    difficulty: usize,

    /// Optional cap on nonce attempts per block; `None` searches unbounded
    mine_limit: Option<u64>,
}

impl Blockchain {
    /// Creates a new blockchain with a mined genesis block
    ///
    /// # Arguments
    ///
    /// * `difficulty` - Number of leading zero hex digits required in a valid
    ///   block hash. Typical educational values are 1 to 4; the genesis nonce
    ///   search is unbounded, so large values block construction accordingly.
    ///
    /// # Returns
    ///
    /// A new Blockchain instance whose only entry is the genesis block
    pub fn new(difficulty: usize) -> Self {
        let blockchain = Blockchain {
            chain: Arc::new(Mutex::new(Vec::new())),
            pending_transactions: Arc::new(Mutex::new(Vec::new())),
            difficulty,
            mine_limit: None,
        };

        blockchain.create_genesis_block();

        blockchain
    }

    /// Caps the nonce search of subsequent appends at `limit` attempts
    ///
    /// The default search is unbounded. With a cap in place, appends whose
    /// search exhausts the cap fail with [`BlockchainError::MiningExhausted`]
    /// and leave the chain and the pool unchanged.
    pub fn with_mine_limit(mut self, limit: u64) -> Self {
        self.mine_limit = Some(limit);
        self
    }

    /// Creates the genesis block (first block in the chain)
    fn create_genesis_block(&self) {
        let data = BlockData::Custom(serde_json::json!({"message": "Genesis Block"}));
        let builder = BlockBuilder::new(0, GENESIS_PREVIOUS_HASH.to_string(), data);

        let genesis_block = match pow::mine(builder, self.difficulty, None) {
            MineOutcome::Found(block) => block,
            MineOutcome::Exhausted { .. } => unreachable!("unbounded nonce search cannot exhaust"),
        };

        self.chain.lock().unwrap().push(genesis_block);
    }

    /// Gets the last block in the chain
    ///
    /// # Returns
    ///
    /// The last block in the chain (a genesis block always exists)
    pub fn get_latest_block(&self) -> Block {
        let chain = self.chain.lock().unwrap();
        chain.last().unwrap().clone()
    }

    /// Adds a new transaction to the pending pool
    ///
    /// The record may be any serializable key-value mapping; no semantic
    /// validation is performed. An arrival `timestamp` field (unix
    /// milliseconds) is stamped onto records that do not carry one.
    ///
    /// # Arguments
    ///
    /// * `record` - The transaction record to enqueue
    ///
    /// # Returns
    ///
    /// Result with () on success; fails only when the record cannot be
    /// canonically encoded or is not a key-value mapping
    pub fn add_transaction<T: Serialize>(&self, record: T) -> Result<(), BlockchainError> {
        let value = serde_json::to_value(record)?;
        let mut transaction = Transaction::from_value(value)?;
        transaction.stamp_arrival(Utc::now().timestamp_millis());

        info!("Transaction added to pool: {}", transaction);
        self.pending_transactions.lock().unwrap().push(transaction);

        Ok(())
    }

    /// Mines the pending transactions into a new block and appends it
    ///
    /// The pool is snapshotted as the block payload (an empty pool yields a
    /// valid but contentless block) and cleared once the block has been
    /// appended. On failure the pool is left intact. The pool guard is held
    /// for the whole mine-and-append, so a concurrent
    /// [`add_transaction`](Self::add_transaction) blocks until the append
    /// finishes and its record lands in the pool for the next block rather
    /// than being erased by the clear.
    ///
    /// # Returns
    ///
    /// Result with the newly appended block
    pub fn append_block(&self) -> Result<Block, BlockchainError> {
        let mut pending = self.pending_transactions.lock().unwrap();

        let block = self.mine_next(BlockData::Transactions {
            transactions: pending.clone(),
        })?;

        pending.clear();

        Ok(block)
    }

    /// Mines a block carrying a caller-supplied payload and appends it
    ///
    /// Custom blocks bypass the transaction pool entirely: the pool is left
    /// untouched and its contents remain pending for the next
    /// [`append_block`](Self::append_block).
    ///
    /// # Arguments
    ///
    /// * `data` - The payload to commit in place of the pool snapshot
    ///
    /// # Returns
    ///
    /// Result with the newly appended block
    pub fn append_block_with_data<T: Serialize>(&self, data: T) -> Result<Block, BlockchainError> {
        let value = serde_json::to_value(data)?;

        self.mine_next(BlockData::Custom(value))
    }

    /// Builds, mines and appends the next block while holding the chain lock,
    /// so concurrent appends cannot interleave.
    fn mine_next(&self, data: BlockData) -> Result<Block, BlockchainError> {
        let mut chain = self.chain.lock().unwrap();
        let latest_block = chain.last().unwrap().clone();

        let builder = BlockBuilder::new(latest_block.index + 1, latest_block.hash.clone(), data);

        let block = match pow::mine(builder, self.difficulty, self.mine_limit) {
            MineOutcome::Found(block) => block,
            MineOutcome::Exhausted { attempts } => {
                return Err(BlockchainError::MiningExhausted {
                    attempts,
                    difficulty: self.difficulty,
                })
            }
        };

        if !is_valid_new_block(&block, &latest_block, self.difficulty) {
            return Err(BlockchainError::InvalidBlock(format!(
                "block {} failed pre-append checks",
                block.index
            )));
        }

        info!("Block #{} appended to the chain", block.index);
        chain.push(block.clone());

        Ok(block)
    }

    /// Validates the blockchain, reporting the first violation found
    ///
    /// Every block is checked for self-consistency (stored hash equals its
    /// recomputation) and proof of work; every block after genesis is also
    /// checked for linkage to its predecessor's hash.
    ///
    /// # Returns
    ///
    /// Ok(()) if the chain is valid, otherwise the position and kind of the
    /// first failure
    pub fn validate(&self) -> Result<(), ValidationError> {
        let chain = self.chain.lock().unwrap();
        validate_blocks(&chain, self.difficulty)
    }

    /// Validates the blockchain
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_chain_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!("Chain validation failed: {}", err);
                false
            }
        }
    }

    /// Gets the entire blockchain
    ///
    /// # Returns
    ///
    /// A vector of all blocks in the chain
    pub fn get_chain(&self) -> Vec<Block> {
        self.chain.lock().unwrap().clone()
    }

    /// Gets all pending transactions
    ///
    /// # Returns
    ///
    /// A vector of all pending transactions
    pub fn get_pending_transactions(&self) -> Vec<Transaction> {
        self.pending_transactions.lock().unwrap().clone()
    }

    /// Gets the mining difficulty
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Prints every block in the chain to standard output
    pub fn print_chain(&self) {
        println!("\n=== BLOCKCHAIN ===");
        for block in self.chain.lock().unwrap().iter() {
            println!("{}", block);
            println!("{}", "-".repeat(30));
        }
    }
}

/// Sanity checks a freshly mined block against the current tip before it is
/// appended: index succession, linkage, self-hash and proof of work.
fn is_valid_new_block(new_block: &Block, previous_block: &Block, difficulty: usize) -> bool {
    if previous_block.index + 1 != new_block.index {
        warn!("Invalid index on block {}", new_block.index);
        return false;
    }

    if previous_block.hash != new_block.previous_hash {
        warn!("Invalid previous hash on block {}", new_block.index);
        return false;
    }

    if new_block.compute_hash() != new_block.hash {
        warn!("Invalid hash on block {}", new_block.index);
        return false;
    }

    if !pow::meets_difficulty(&new_block.hash, difficulty) {
        warn!("Proof of work on block {} does not meet difficulty", new_block.index);
        return false;
    }

    true
}

/// Validates an ordered sequence of blocks against a difficulty target.
/// Genesis is checked for self-consistency and proof of work only; it has no
/// predecessor to link to.
fn validate_blocks(blocks: &[Block], difficulty: usize) -> Result<(), ValidationError> {
    if let Some(genesis) = blocks.first() {
        if genesis.hash != genesis.compute_hash() {
            return Err(ValidationError::HashMismatch { index: 0 });
        }
        if !pow::meets_difficulty(&genesis.hash, difficulty) {
            return Err(ValidationError::InsufficientWork {
                index: 0,
                difficulty,
            });
        }
    }

    for i in 1..blocks.len() {
        let current_block = &blocks[i];
        let previous_block = &blocks[i - 1];
        let index = i as u64;

        if current_block.hash != current_block.compute_hash() {
            return Err(ValidationError::HashMismatch { index });
        }

        if current_block.previous_hash != previous_block.hash {
            return Err(ValidationError::BrokenLink { index });
        }

        if !pow::meets_difficulty(&current_block.hash, difficulty) {
            return Err(ValidationError::InsufficientWork { index, difficulty });
        }
    }

    Ok(())
}
