//! Ledger: chain ownership, admission, mining rounds and validation
//!
//! The ledger owns an append-only chain of sealed blocks (index 0 is the
//! genesis block) and a mutable pool of pending transactions. Balances are
//! never stored; they are derived by replaying the sealed chain. Appended
//! blocks are reachable only through read-only accessors, so the chain can
//! grow but never shrink, reorder or mutate.

use tracing::{debug, info};

use crate::block::Block;
use crate::config::LedgerConfig;
use crate::crypto::{Address, Amount, Balance, Digest};
use crate::error::{MineError, RejectReason, ValidationError};
use crate::miner::CancelToken;
use crate::transaction::Transaction;

pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    difficulty: u32,
    reward: Amount,
}

impl Ledger {
    /// Create a ledger with an eagerly computed genesis block and an empty
    /// pending pool. `difficulty` counts required leading hex zeros;
    /// `reward` is the amount minted to a miner each round.
    pub fn new(difficulty: u32, reward: Amount) -> Self {
        let genesis = Block::genesis();
        info!(digest = %genesis.digest, difficulty, reward, "ledger created");
        Ledger {
            chain: vec![genesis],
            pending: Vec::new(),
            difficulty,
            reward,
        }
    }

    /// Create a ledger whose initial pool already holds one system reward
    /// for `recipient` — the same pool state every mining round leaves
    /// behind. This is the supported way to put currency into circulation:
    /// with balance-checked admission, a chain with no sealed funds has no
    /// admissible transaction and therefore nothing to mine.
    pub fn with_bootstrap_reward(
        difficulty: u32,
        reward: Amount,
        recipient: impl Into<Address>,
    ) -> Self {
        let mut ledger = Self::new(difficulty, reward);
        ledger.pending.push(Transaction::reward(recipient, reward));
        ledger
    }

    /// Build a ledger from a validated configuration.
    pub fn with_config(config: &LedgerConfig) -> Result<Self, crate::error::ConfigError> {
        config.validate()?;
        Ok(match &config.bootstrap_address {
            Some(address) => {
                Self::with_bootstrap_reward(config.difficulty, config.reward, address.clone())
            }
            None => Self::new(config.difficulty, config.reward),
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The full ordered chain, genesis first.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// The most recently appended block.
    pub fn tip(&self) -> &Block {
        self.chain
            .last()
            .expect("chain always contains the genesis block")
    }

    /// Transactions admitted but not yet sealed.
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn reward(&self) -> Amount {
        self.reward
    }

    // ------------------------------------------------------------------
    // Admission
    // ------------------------------------------------------------------

    /// Admit `tx` into the pending pool.
    ///
    /// Rejections, checked in order: [`RejectReason::MissingParty`] when the
    /// sender is absent or empty or the recipient is empty;
    /// [`RejectReason::NonPositiveAmount`] when the amount is zero;
    /// [`RejectReason::InsufficientBalance`] when the sender's sealed
    /// balance is below the amount. Admission reserves nothing: several
    /// admitted transactions can jointly overdraw a sender before a block
    /// seals, which is an accepted limitation of this design.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), RejectReason> {
        let sender = match &tx.sender {
            Some(sender) if !sender.is_empty() => sender,
            // Rewards are system-issued; callers cannot admit them.
            _ => return Err(RejectReason::MissingParty),
        };
        if tx.recipient.is_empty() {
            return Err(RejectReason::MissingParty);
        }
        if tx.amount == 0 {
            return Err(RejectReason::NonPositiveAmount);
        }

        let have = self.balance_of(sender);
        if have < Balance::from(tx.amount) {
            return Err(RejectReason::InsufficientBalance {
                have,
                need: tx.amount,
            });
        }

        debug!(sender = %sender, recipient = %tx.recipient, amount = tx.amount, "transaction admitted");
        self.pending.push(tx);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mining
    // ------------------------------------------------------------------

    /// Seal the pending pool into a new block and append it, then seed the
    /// pool with one reward transaction for `miner_address` — realized when
    /// the *next* block seals. Returns the new block's index. Fails with
    /// [`MineError::EmptyPool`] when there is nothing to seal.
    pub fn mine_pending(&mut self, miner_address: &str) -> Result<u64, MineError> {
        self.mine_pending_with(miner_address, &CancelToken::new())
    }

    /// Cancellable mining round. On cancellation the pool is restored
    /// unchanged and [`MineError::Cancelled`] is returned; the chain is
    /// never left partially updated.
    pub fn mine_pending_with(
        &mut self,
        miner_address: &str,
        cancel: &CancelToken,
    ) -> Result<u64, MineError> {
        let transactions = self.take_pending()?;
        let previous_digest = self.tip().digest;

        match Block::seal_with(transactions, previous_digest, self.difficulty, cancel) {
            Ok(block) => Ok(self.commit_block(block, miner_address)),
            Err(interrupted) => {
                self.restore_pending(interrupted.transactions);
                Err(MineError::Cancelled)
            }
        }
    }

    /// Move the pool out for sealing. The pool stays frozen (empty) until
    /// the sealed block is committed or the transactions are restored.
    pub(crate) fn take_pending(&mut self) -> Result<Vec<Transaction>, MineError> {
        if self.pending.is_empty() {
            return Err(MineError::EmptyPool);
        }
        Ok(std::mem::take(&mut self.pending))
    }

    /// Put back transactions from a cancelled sealing, exactly as taken.
    pub(crate) fn restore_pending(&mut self, transactions: Vec<Transaction>) {
        debug_assert!(self.pending.is_empty());
        self.pending = transactions;
    }

    /// Append a sealed block and seed the next round's pool with the miner
    /// reward. Returns the appended block's index.
    pub(crate) fn commit_block(&mut self, block: Block, miner_address: &str) -> u64 {
        let height = self.chain.len() as u64;
        info!(height, digest = %block.digest, transactions = block.transactions.len(),
            "sealed block appended to chain");
        self.chain.push(block);
        self.pending = vec![Transaction::reward(miner_address, self.reward)];
        height
    }

    /// Sealing context captured under the same mutation as the pool move.
    pub(crate) fn sealing_inputs(&self) -> (Digest, u32) {
        (self.tip().digest, self.difficulty)
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    /// Replay every transaction in every sealed block, in chain order:
    /// debit the sender, credit the recipient. Pending transactions never
    /// count. O(total transactions).
    pub fn balance_of(&self, address: &str) -> Balance {
        let mut balance: Balance = 0;
        for block in &self.chain {
            for tx in &block.transactions {
                if tx.sender.as_deref() == Some(address) {
                    balance -= Balance::from(tx.amount);
                }
                if tx.recipient == address {
                    balance += Balance::from(tx.amount);
                }
            }
        }
        balance
    }

    /// Walk the chain and report the first defect, if any.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_chain(&self.chain)
    }

    /// Whole-chain integrity as a plain boolean.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Validate any ordered block slice: every block after the first must carry
/// a digest matching its recomputed digest (tamper evidence) and link to
/// the preceding block's digest (splice evidence). Short-circuits on the
/// first defect. The genesis block is the fixed starting point and is not
/// separately validated.
pub fn validate_chain(blocks: &[Block]) -> Result<(), ValidationError> {
    for height in 1..blocks.len() {
        let current = &blocks[height];
        if current.digest != current.recompute_digest() {
            return Err(ValidationError::InvalidDigest { height });
        }
        if current.previous_digest != blocks[height - 1].digest {
            return Err(ValidationError::BrokenLinkage { height });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFFICULTY: u32 = 1;
    const REWARD: Amount = 100;

    /// Ledger with one mined round: "alice" holds the bootstrap reward and
    /// the pool carries the reward for "miner".
    fn funded_ledger() -> Ledger {
        let mut ledger = Ledger::with_bootstrap_reward(DIFFICULTY, REWARD, "alice");
        ledger.mine_pending("miner").expect("bootstrap round");
        ledger
    }

    #[test]
    fn fresh_ledger_has_genesis_only() {
        let ledger = Ledger::new(DIFFICULTY, REWARD);
        assert_eq!(ledger.chain().len(), 1);
        assert!(ledger.pending().is_empty());
        assert_eq!(ledger.balance_of("anyone"), 0);
        assert!(ledger.is_valid());
    }

    #[test]
    fn mining_empty_pool_is_rejected() {
        let mut ledger = Ledger::new(DIFFICULTY, REWARD);
        assert_eq!(ledger.mine_pending("miner"), Err(MineError::EmptyPool));
        assert_eq!(ledger.chain().len(), 1);
    }

    #[test]
    fn admission_rejects_missing_parties() {
        let mut ledger = funded_ledger();
        assert_eq!(
            ledger.add_transaction(Transaction::reward("bob", 50)),
            Err(RejectReason::MissingParty)
        );
        assert_eq!(
            ledger.add_transaction(Transaction::new("", "bob", 50)),
            Err(RejectReason::MissingParty)
        );
        assert_eq!(
            ledger.add_transaction(Transaction::new("alice", "", 50)),
            Err(RejectReason::MissingParty)
        );
    }

    #[test]
    fn admission_rejects_zero_amount() {
        let mut ledger = funded_ledger();
        assert_eq!(
            ledger.add_transaction(Transaction::new("alice", "bob", 0)),
            Err(RejectReason::NonPositiveAmount)
        );
    }

    #[test]
    fn admission_rejects_overdraft_of_unsealed_balance() {
        let mut ledger = Ledger::with_bootstrap_reward(DIFFICULTY, REWARD, "alice");
        // The bootstrap reward is still pending, so alice's balance is 0.
        assert_eq!(
            ledger.add_transaction(Transaction::new("alice", "bob", 50)),
            Err(RejectReason::InsufficientBalance { have: 0, need: 50 })
        );
    }

    #[test]
    fn reward_is_realized_on_the_next_round() {
        let mut ledger = Ledger::with_bootstrap_reward(DIFFICULTY, REWARD, "alice");

        ledger.mine_pending("miner").expect("first round");
        assert_eq!(ledger.balance_of("alice"), 100);
        assert_eq!(ledger.balance_of("miner"), 0);

        ledger.mine_pending("miner").expect("second round");
        assert_eq!(ledger.balance_of("miner"), 100);
    }

    #[test]
    fn transfers_move_sealed_funds() {
        let mut ledger = funded_ledger();
        ledger
            .add_transaction(Transaction::new("alice", "bob", 40))
            .expect("alice holds 100");
        let height = ledger.mine_pending("miner").expect("round");

        assert_eq!(height, 2);
        assert_eq!(ledger.balance_of("alice"), 60);
        assert_eq!(ledger.balance_of("bob"), 40);
        // The first round's reward sealed alongside the transfer.
        assert_eq!(ledger.balance_of("miner"), 100);
        assert!(ledger.is_valid());
    }

    #[test]
    fn concurrent_admissions_can_overdraw() {
        let mut ledger = funded_ledger();
        // Both admissions see alice's sealed balance of 100; nothing is
        // reserved, so together they overdraw her.
        ledger
            .add_transaction(Transaction::new("alice", "bob", 80))
            .expect("first spend");
        ledger
            .add_transaction(Transaction::new("alice", "carol", 80))
            .expect("second spend sees the same balance");
        ledger.mine_pending("miner").expect("round");

        assert_eq!(ledger.balance_of("alice"), -60);
        assert_eq!(ledger.balance_of("bob"), 80);
        assert_eq!(ledger.balance_of("carol"), 80);
    }

    #[test]
    fn transfers_are_zero_sum_against_minted_rewards() {
        let mut ledger = funded_ledger();
        ledger
            .add_transaction(Transaction::new("alice", "bob", 25))
            .expect("spend");
        ledger.mine_pending("miner").expect("round two");
        ledger.mine_pending("miner").expect("round three");

        let minted: Balance = ledger
            .chain()
            .iter()
            .flat_map(|block| &block.transactions)
            .filter(|tx| tx.is_reward())
            .map(|tx| Balance::from(tx.amount))
            .sum();
        let total: Balance = ["alice", "bob", "miner"]
            .iter()
            .map(|address| ledger.balance_of(address))
            .sum();
        assert_eq!(total, minted);
    }

    #[test]
    fn tampered_amount_invalidates_chain() {
        let mut ledger = funded_ledger();
        assert!(ledger.is_valid());

        ledger.chain[1].transactions[0].amount = 1_000_000;
        assert!(!ledger.is_valid());
        assert_eq!(
            ledger.validate(),
            Err(ValidationError::InvalidDigest { height: 1 })
        );
    }

    #[test]
    fn spliced_linkage_invalidates_chain() {
        let mut ledger = funded_ledger();
        ledger.mine_pending("miner").expect("second block");

        // Re-seal block 2 against an unrelated digest: internally
        // self-consistent, but the link to block 1 is broken.
        let foreign = Digest::compute(b"unrelated");
        let spliced = Block::seal(ledger.chain[2].transactions.clone(), foreign, DIFFICULTY);
        ledger.chain[2] = spliced;

        assert_eq!(
            ledger.validate(),
            Err(ValidationError::BrokenLinkage { height: 2 })
        );
    }

    #[test]
    fn validation_is_idempotent() {
        let mut ledger = funded_ledger();
        assert_eq!(ledger.validate(), ledger.validate());

        ledger.chain[1].nonce += 1;
        assert_eq!(ledger.validate(), ledger.validate());
        assert!(!ledger.is_valid());
    }

    #[test]
    fn cancelled_round_leaves_pool_unchanged() {
        // A difficulty beyond 64 hex characters can never be met, so the
        // search spins until the token trips.
        let mut ledger = Ledger::with_bootstrap_reward(65, REWARD, "alice");
        let pool_before = ledger.pending().to_vec();

        let cancel = CancelToken::new();
        cancel.cancel();

        assert_eq!(
            ledger.mine_pending_with("miner", &cancel),
            Err(MineError::Cancelled)
        );
        assert_eq!(ledger.pending(), pool_before.as_slice());
        assert_eq!(ledger.chain().len(), 1);
    }

    #[test]
    fn config_construction_respects_bootstrap() {
        let config = LedgerConfig {
            difficulty: 1,
            reward: 7,
            bootstrap_address: Some("faucet".to_string()),
        };
        let ledger = Ledger::with_config(&config).expect("valid config");
        assert_eq!(ledger.pending().len(), 1);
        assert!(ledger.pending()[0].is_reward());
        assert_eq!(ledger.reward(), 7);
    }
}
