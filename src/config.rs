//! Configuration management for Minichain

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::crypto::{Address, Amount};
use crate::error::ConfigError;

/// Operator ceiling on proof-of-work difficulty. Expected search cost is
/// 16^difficulty digests, so anything above this stops being interactive.
pub const MAX_INTERACTIVE_DIFFICULTY: u32 = 6;

/// Ledger construction parameters. Difficulty and reward are fixed for the
/// lifetime of a ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Required leading hex zeros on every sealed digest.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    /// Amount minted to the miner of each sealed block.
    #[serde(default = "default_reward")]
    pub reward: Amount,
    /// When set, the initial pending pool is seeded with one system reward
    /// for this address so the chain can bootstrap under balance-checked
    /// admission.
    #[serde(default)]
    pub bootstrap_address: Option<Address>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            difficulty: default_difficulty(),
            reward: default_reward(),
            bootstrap_address: None,
        }
    }
}

impl LedgerConfig {
    /// Validate critical values before a ledger is built from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reward == 0 {
            return Err(ConfigError::Invalid(
                "reward must be greater than zero".to_string(),
            ));
        }
        if self.difficulty > MAX_INTERACTIVE_DIFFICULTY {
            return Err(ConfigError::Invalid(format!(
                "difficulty {} exceeds the interactive ceiling of {}",
                self.difficulty, MAX_INTERACTIVE_DIFFICULTY
            )));
        }
        if let Some(address) = &self.bootstrap_address {
            if address.is_empty() {
                return Err(ConfigError::Invalid(
                    "bootstrap_address must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Load a configuration file, falling back to defaults when it is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<LedgerConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(LedgerConfig::default());
    }
    let text = fs::read_to_string(path)?;
    LedgerConfig::from_toml(&text)
}

fn default_difficulty() -> u32 {
    2
}

fn default_reward() -> Amount {
    100
}
