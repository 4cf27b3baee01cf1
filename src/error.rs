//! Error types for Minichain
//!
//! Every fallible operation reports an explicit, recoverable result value.
//! Nothing here is fatal to the process.

use thiserror::Error;

use crate::crypto::{Amount, Balance};

/// Why a transaction was refused admission into the pending pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Sender is absent or empty, or the recipient is empty. Reward
    /// transactions are system-issued and cannot be admitted by callers.
    #[error("transaction must name both a sender and a recipient")]
    MissingParty,

    #[error("transaction amount must be greater than zero")]
    NonPositiveAmount,

    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Balance, need: Amount },
}

/// Why a mining round did not append a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MineError {
    #[error("no pending transactions to mine")]
    EmptyPool,

    /// The proof-of-work search was cancelled before a satisfying nonce was
    /// found. The pending pool is left exactly as it was.
    #[error("proof-of-work search cancelled")]
    Cancelled,
}

/// First defect found while walking the chain. `height` is the index of the
/// offending block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block {height}: stored digest does not match the recomputed digest")]
    InvalidDigest { height: usize },

    #[error("block {height}: previous-digest link does not match the prior block")]
    BrokenLinkage { height: usize },
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
