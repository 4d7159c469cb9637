use log::{debug, info};

use super::block::{Block, BlockBuilder};

/// How often the nonce search reports progress, in attempts
const PROGRESS_INTERVAL: u64 = 100_000;

/// Result of a nonce search
#[derive(Debug)]
pub enum MineOutcome {
    /// A nonce satisfying the difficulty target was found; the candidate is
    /// sealed into an immutable block.
    Found(Block),

    /// The attempt cap was reached before any nonce satisfied the target. The
    /// candidate block is discarded.
    Exhausted { attempts: u64 },
}

/// Searches for a nonce whose block hash meets the difficulty target
///
/// Starting from the builder's current nonce (typically 0), the hash is
/// recomputed and the nonce incremented until the first `difficulty` hex
/// characters of the hash are all `'0'`. With `max_attempts = None` the search
/// is unbounded and blocks the caller until it succeeds; expected attempts
/// grow as 16^difficulty, so large difficulties mean unbounded latency.
///
/// # Arguments
///
/// * `builder` - The candidate block; only its nonce is varied
/// * `difficulty` - Required number of leading zero hex digits
/// * `max_attempts` - Optional cap on failed attempts before giving up
///
/// # Returns
///
/// `Found` with the sealed block, or `Exhausted` when the cap was hit
pub fn mine(mut builder: BlockBuilder, difficulty: usize, max_attempts: Option<u64>) -> MineOutcome {
    debug!("Mining block {}...", builder.index());

    let mut attempts: u64 = 0;
    loop {
        let hash = builder.compute_hash();

        if meets_difficulty(&hash, difficulty) {
            info!(
                "Block {} mined with nonce {} and hash {}",
                builder.index(),
                builder.nonce(),
                hash
            );
            return MineOutcome::Found(builder.seal(hash));
        }

        attempts += 1;
        if attempts % PROGRESS_INTERVAL == 0 {
            debug!("Attempts: {}, current hash: {}", attempts, hash);
        }
        if let Some(limit) = max_attempts {
            if attempts >= limit {
                return MineOutcome::Exhausted { attempts };
            }
        }

        builder.set_nonce(builder.nonce() + 1);
    }
}

/// Checks whether a hex-encoded hash starts with `difficulty` zero digits
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    difficulty <= hash.len() && hash.as_bytes()[..difficulty].iter().all(|&b| b == b'0')
}
