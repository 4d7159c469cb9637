// Blockchain module
//
// This module contains the core blockchain implementation including:
// - Block structure (mutable builder, immutable committed block)
// - Blockchain structure with the pending transaction pool
// - Transaction records
// - Proof of work algorithm

pub mod block;
pub mod chain;
pub mod pow;
pub mod transaction;

// Re-export main components for easier access
pub use block::{Block, BlockBuilder, BlockData};
pub use chain::{Blockchain, BlockchainError, ValidationError, GENESIS_PREVIOUS_HASH};
pub use pow::MineOutcome;
pub use transaction::{Transaction, TransactionError};
