//! Block structure and the proof-of-work search
//!
//! A block is immutable once sealed: its digest commits to the previous
//! block's digest, its timestamp, its ordered transactions and its nonce.
//! Sealing is a brute-force search for a nonce whose digest carries the
//! required number of leading hexadecimal zeros.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use tracing::{debug, info};

use crate::crypto::Digest;
use crate::miner::CancelToken;
use crate::transaction::Transaction;

/// How often the search reports progress, in nonces.
const PROGRESS_LOG_INTERVAL: u64 = 10_000;

/// Returned when a cancelled search gives its transactions back so the
/// caller can restore the pending pool untouched.
#[derive(Debug)]
pub struct SealInterrupted {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub transactions: Vec<Transaction>,
    /// Digest of the preceding block; all-zero for genesis.
    pub previous_digest: Digest,
    /// Unix timestamp in milliseconds, captured when sealing began.
    pub timestamp: u64,
    pub nonce: u64,
    pub digest: Digest,
}

impl Block {
    /// The fixed starting point of every chain: zero previous digest, no
    /// transactions, digest computed once. Genesis is not mined.
    pub fn genesis() -> Self {
        let mut block = Block {
            transactions: Vec::new(),
            previous_digest: Digest::zero(),
            timestamp: now_millis(),
            nonce: 0,
            digest: Digest::zero(),
        };
        block.digest = block.recompute_digest();
        block
    }

    /// Seal `transactions` into a block linked to `previous_digest`,
    /// searching for a nonce whose digest has `difficulty` leading hex
    /// zeros. Expected cost grows as 16^difficulty; the caller is
    /// responsible for keeping difficulty within an interactive ceiling
    /// (see [`crate::config`]).
    pub fn seal(transactions: Vec<Transaction>, previous_digest: Digest, difficulty: u32) -> Block {
        match Self::seal_with(transactions, previous_digest, difficulty, &CancelToken::new()) {
            Ok(block) => block,
            // A token private to this call is never cancelled.
            Err(_) => unreachable!("search with a private cancel token cannot be interrupted"),
        }
    }

    /// Cancellable sealing. Checks `cancel` on every iteration; on
    /// cancellation the original transactions are handed back and no block
    /// exists.
    pub fn seal_with(
        transactions: Vec<Transaction>,
        previous_digest: Digest,
        difficulty: u32,
        cancel: &CancelToken,
    ) -> Result<Block, SealInterrupted> {
        let mut block = Block {
            transactions,
            previous_digest,
            timestamp: now_millis(),
            nonce: 0,
            digest: Digest::zero(),
        };
        block.digest = block.recompute_digest();

        while !block.digest.meets_difficulty(difficulty) {
            if cancel.is_cancelled() {
                return Err(SealInterrupted {
                    transactions: block.transactions,
                });
            }
            block.nonce += 1;
            block.digest = block.recompute_digest();
            if block.nonce % PROGRESS_LOG_INTERVAL == 0 {
                debug!(nonce = block.nonce, digest = %block.digest, "proof-of-work search in progress");
            }
        }

        info!(nonce = block.nonce, digest = %block.digest, "block sealed");
        Ok(block)
    }

    /// Recompute the digest from the block's current fields.
    ///
    /// Preimage, in order: previous digest (32 raw bytes), timestamp
    /// (u64-LE), transaction count (u64-LE) followed by each transaction's
    /// canonical bytes, nonce (u64-LE). Deterministic for identical field
    /// values; used both by the search and by independent verification.
    pub fn recompute_digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.previous_digest.as_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.canonical_bytes());
        }
        hasher.update(self.nonce.to_le_bytes());
        Digest(hasher.finalize().into())
    }
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
