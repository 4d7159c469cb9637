use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::transaction::Transaction;

/// The payload carried by a block
///
/// Either a snapshot of the pending transaction pool or an opaque
/// caller-supplied record. Serialized untagged, so the pool variant appears as
/// `{"transactions": [...]}` and a custom payload as the raw value.
///
/// Deserialization is shape-driven: a custom payload that happens to look
/// like `{"transactions": [<objects>]}` comes back as the pool variant. The
/// two forms serialize identically, so hashing and validation are unaffected;
/// only variant identity is ambiguous for that one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockData {
    /// Snapshot of the pending transaction pool at mining time
    Transactions { transactions: Vec<Transaction> },

    /// Caller-supplied payload that bypasses the transaction pool
    Custom(Value),
}

impl fmt::Display for BlockData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// A candidate block under construction
///
/// Mining is the only process allowed to change the nonce, and it happens
/// before the block is committed. The builder is the mutable stage; sealing it
/// with the winning hash produces an immutable [`Block`].
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    index: u64,
    previous_hash: String,
    timestamp: DateTime<Utc>,
    data: BlockData,
    nonce: u64,
}

impl BlockBuilder {
    /// Creates a candidate block at the given chain position
    ///
    /// # Arguments
    ///
    /// * `index` - The position the block will occupy in the chain
    /// * `previous_hash` - The hash of the current chain tip
    /// * `data` - The payload to commit
    ///
    /// # Returns
    ///
    /// A builder stamped with the current time and a zero nonce
    pub fn new(index: u64, previous_hash: String, data: BlockData) -> Self {
        BlockBuilder {
            index,
            previous_hash,
            timestamp: Utc::now(),
            data,
            nonce: 0,
        }
    }

    /// Overrides the creation timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Gets the index this block will occupy
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Gets the current nonce
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Sets the nonce for the next hashing attempt
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    /// Calculates the hash of the candidate block at its current nonce
    pub fn compute_hash(&self) -> String {
        hash_fields(
            self.index,
            &self.previous_hash,
            &self.timestamp,
            &self.data,
            self.nonce,
        )
    }

    /// Freezes the builder into an immutable block
    ///
    /// `hash` must be the digest of the builder's current fields; the nonce
    /// search hands over the hash it just verified.
    pub(crate) fn seal(self, hash: String) -> Block {
        Block {
            index: self.index,
            previous_hash: self.previous_hash,
            timestamp: self.timestamp,
            data: self.data,
            nonce: self.nonce,
            hash,
        }
    }
}

/// Represents a committed block in the blockchain
///
/// Immutable once sealed: the public API exposes read-only accessors, so the
/// stored hash always matches a recomputation of the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Index of the block in the chain
    pub(crate) index: u64,

    /// Hash of the previous block (the genesis sentinel for block 0)
    pub(crate) previous_hash: String,

    /// Timestamp when the block was created
    pub(crate) timestamp: DateTime<Utc>,

    /// Payload committed in this block
    pub(crate) data: BlockData,

    /// Proof of work nonce
    pub(crate) nonce: u64,

    /// Hash of the block, found during mining
    pub(crate) hash: String,
}

impl Block {
    /// Gets the index of the block in the chain
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Gets the hash of the previous block
    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// Gets the creation timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Gets the payload
    pub fn data(&self) -> &BlockData {
        &self.data
    }

    /// Gets the proof of work nonce
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Gets the stored hash
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Recalculates the hash of the block from its stored fields
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block as a hexadecimal string. Validation
    /// compares this against the stored hash to detect tampering.
    pub fn compute_hash(&self) -> String {
        hash_fields(
            self.index,
            &self.previous_hash,
            &self.timestamp,
            &self.data,
            self.nonce,
        )
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block #{}", self.index)?;
        writeln!(f, "Hash: {}", self.hash)?;
        writeln!(f, "Previous Hash: {}", self.previous_hash)?;
        writeln!(f, "Timestamp: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Data: {}", self.data)?;
        write!(f, "Nonce: {}", self.nonce)
    }
}

/// Canonical block digest: the hashed fields are serialized as a JSON object
/// whose keys are sorted (serde_json's default map representation), so
/// identical logical content always yields an identical hash.
fn hash_fields(
    index: u64,
    previous_hash: &str,
    timestamp: &DateTime<Utc>,
    data: &BlockData,
    nonce: u64,
) -> String {
    let block_data = serde_json::json!({
        "index": index,
        "previous_hash": previous_hash,
        "timestamp": timestamp,
        "data": data,
        "nonce": nonce,
    });

    let mut hasher = Sha256::new();
    hasher.update(block_data.to_string().as_bytes());

    hex::encode(hasher.finalize())
}
