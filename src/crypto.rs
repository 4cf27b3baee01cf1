//! Cryptographic primitives for Minichain
//!
//! The chain hashes with SHA-256 and exposes digests at the API boundary as
//! fixed-width 64-character lowercase hexadecimal strings.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

/// An account identifier. Opaque to the ledger; any non-empty string works.
pub type Address = String;

/// A transferred quantity. Strictly positive for every admitted transaction.
pub type Amount = u64;

/// A derived account balance. Signed: admission-time checks do not stop
/// several in-flight transactions from jointly overdrawing a sender, so the
/// replayed balance of an address can go below zero.
pub type Balance = i128;

/// Width of a digest rendered as hexadecimal characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// A SHA-256 digest. Serializes as its 64-character lowercase hex form,
/// which is also the representation consumed and produced at the API
/// boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// The all-zero digest, used as the previous-digest sentinel of the
    /// genesis block.
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Compute the SHA-256 digest of arbitrary bytes.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the 64-character lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string back into a digest.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let bytes: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Number of leading `'0'` characters in the hex rendering. Each byte
    /// contributes two hex characters, high nibble first.
    pub fn leading_hex_zeros(&self) -> u32 {
        let mut zeros = 0;
        for byte in self.0 {
            if byte == 0 {
                zeros += 2;
                continue;
            }
            if byte >> 4 == 0 {
                zeros += 1;
            }
            break;
        }
        zeros
    }

    /// The proof-of-work predicate: at least `difficulty` leading hex zeros.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_hex_zeros() >= difficulty
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Digest({}..{})", &hex[..8], &hex[56..])
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s)
            .ok_or_else(|| de::Error::custom(format!("expected {DIGEST_HEX_LEN} hex characters")))
    }
}
