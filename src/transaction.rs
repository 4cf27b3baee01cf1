//! Transaction values for Minichain
//!
//! A transaction describes a single transfer. A `None` sender marks a
//! system-issued reward crediting the miner of the previous block; rewards
//! are the only transactions allowed to omit a sender, and they enter the
//! pending pool through the mining round, never through admission.

use serde::{Deserialize, Serialize};

use crate::crypto::{Address, Amount};

/// An immutable transfer of `amount` from `sender` to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// `None` for system-issued reward transactions.
    pub sender: Option<Address>,
    pub recipient: Address,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(sender: impl Into<Address>, recipient: impl Into<Address>, amount: Amount) -> Self {
        Transaction {
            sender: Some(sender.into()),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Build the reward transaction minted to the miner of a sealed block.
    pub fn reward(recipient: impl Into<Address>, amount: Amount) -> Self {
        Transaction {
            sender: None,
            recipient: recipient.into(),
            amount,
        }
    }

    /// Whether this is a system-issued reward (no sender).
    pub fn is_reward(&self) -> bool {
        self.sender.is_none()
    }

    /// Validity predicate: non-empty recipient, positive amount, and a
    /// sender that is either present and non-empty or absent (reward).
    pub fn is_valid(&self) -> bool {
        if self.recipient.is_empty() || self.amount == 0 {
            return false;
        }
        match &self.sender {
            Some(sender) => !sender.is_empty(),
            None => true,
        }
    }

    /// Canonical byte encoding used in block digest preimages.
    ///
    /// Layout, in order:
    /// - sender tag: `0x00` for a reward (absent sender), or `0x01` followed
    ///   by the sender's byte length as u64-LE and its UTF-8 bytes
    /// - recipient byte length as u64-LE, then its UTF-8 bytes
    /// - amount as u64-LE
    ///
    /// Length prefixes keep adjacent string fields from aliasing, so two
    /// distinct transactions never share an encoding.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match &self.sender {
            Some(sender) => {
                bytes.push(0x01);
                bytes.extend_from_slice(&(sender.len() as u64).to_le_bytes());
                bytes.extend_from_slice(sender.as_bytes());
            }
            None => bytes.push(0x00),
        }
        bytes.extend_from_slice(&(self.recipient.len() as u64).to_le_bytes());
        bytes.extend_from_slice(self.recipient.as_bytes());
        bytes.extend_from_slice(&self.amount.to_le_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_is_valid() {
        let tx = Transaction::new("alice", "bob", 50);
        assert!(tx.is_valid());
        assert!(!tx.is_reward());
    }

    #[test]
    fn reward_is_valid_without_sender() {
        let tx = Transaction::reward("miner", 100);
        assert!(tx.is_valid());
        assert!(tx.is_reward());
    }

    #[test]
    fn zero_amount_is_invalid() {
        assert!(!Transaction::new("alice", "bob", 0).is_valid());
    }

    #[test]
    fn empty_parties_are_invalid() {
        assert!(!Transaction::new("alice", "", 10).is_valid());
        assert!(!Transaction::new("", "bob", 10).is_valid());
        assert!(!Transaction::reward("", 10).is_valid());
    }

    #[test]
    fn encoding_distinguishes_reward_from_empty_sender() {
        let reward = Transaction::reward("bob", 10);
        let empty_sender = Transaction {
            sender: Some(String::new()),
            recipient: "bob".to_string(),
            amount: 10,
        };
        assert_ne!(reward.canonical_bytes(), empty_sender.canonical_bytes());
    }

    #[test]
    fn encoding_respects_field_boundaries() {
        // Without length prefixes these two would collide on "ab" + "c".
        let a = Transaction::new("ab", "c", 1);
        let b = Transaction::new("a", "bc", 1);
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn encoding_is_stable() {
        let tx = Transaction::new("alice", "bob", 42);
        assert_eq!(tx.canonical_bytes(), tx.canonical_bytes());
    }
}
