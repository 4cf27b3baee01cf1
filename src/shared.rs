//! Thread-safe single-writer handle over a [`Ledger`]
//!
//! Exactly one logical thread mutates the ledger at a time: every writer
//! serializes on a gate mutex. Readers take the data lock only briefly and
//! always observe a consistent snapshot — never a partially appended block.
//! During a mining round the pool is frozen under a short write lock, the
//! proof-of-work search runs with no data lock held (readers stay live),
//! and the outcome is committed — or the pool restored — under a second
//! short write lock.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::block::Block;
use crate::crypto::Balance;
use crate::error::{MineError, RejectReason, ValidationError};
use crate::ledger::Ledger;
use crate::miner::CancelToken;
use crate::transaction::Transaction;

/// Cheaply cloneable shared handle; all clones see the same ledger.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
    /// Writer gate: held for the whole mining round so admissions cannot
    /// slip into the frozen pool, but distinct from the data lock so the
    /// search itself never blocks readers.
    writer: Arc<Mutex<()>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        SharedLedger {
            inner: Arc::new(RwLock::new(ledger)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    // ------------------------------------------------------------------
    // Writers (serialized on the gate)
    // ------------------------------------------------------------------

    /// Admit a transaction into the pending pool.
    pub fn add_transaction(&self, tx: Transaction) -> Result<(), RejectReason> {
        let _gate = self.writer.lock();
        self.inner.write().add_transaction(tx)
    }

    /// Run one mining round credited to `miner_address`.
    pub fn mine_pending(&self, miner_address: &str) -> Result<u64, MineError> {
        self.mine_pending_with(miner_address, &CancelToken::new())
    }

    /// Cancellable mining round. The pool is moved out under a brief write
    /// lock, sealed off-lock, then committed or restored atomically.
    pub fn mine_pending_with(
        &self,
        miner_address: &str,
        cancel: &CancelToken,
    ) -> Result<u64, MineError> {
        let _gate = self.writer.lock();

        let (transactions, previous_digest, difficulty) = {
            let mut ledger = self.inner.write();
            let transactions = ledger.take_pending()?;
            let (previous_digest, difficulty) = ledger.sealing_inputs();
            (transactions, previous_digest, difficulty)
        };

        match Block::seal_with(transactions, previous_digest, difficulty, cancel) {
            Ok(block) => Ok(self.inner.write().commit_block(block, miner_address)),
            Err(interrupted) => {
                self.inner.write().restore_pending(interrupted.transactions);
                Err(MineError::Cancelled)
            }
        }
    }

    // ------------------------------------------------------------------
    // Readers (snapshot-isolated)
    // ------------------------------------------------------------------

    pub fn balance_of(&self, address: &str) -> Balance {
        self.inner.read().balance_of(address)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.inner.read().validate()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.read().is_valid()
    }

    pub fn chain_len(&self) -> usize {
        self.inner.read().chain().len()
    }

    /// An owned copy of the chain, for display or external serialization.
    pub fn chain_snapshot(&self) -> Vec<Block> {
        self.inner.read().chain().to_vec()
    }

    /// An owned copy of the pending pool.
    pub fn pending_snapshot(&self) -> Vec<Transaction> {
        self.inner.read().pending().to_vec()
    }
}
