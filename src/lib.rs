//! An educational append-only blockchain: hash-linked blocks secured by a
//! proof-of-work puzzle, with a pending transaction pool. Single process,
//! single writer; no networking, persistence or signature cryptography.

pub mod blockchain;

pub use blockchain::{
    Block, BlockBuilder, BlockData, Blockchain, BlockchainError, MineOutcome, Transaction,
    TransactionError, ValidationError,
};
