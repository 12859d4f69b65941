//! Ledger configuration.

use crate::mempool::MempoolConfig;
use ecochain_core::MAX_DIFFICULTY;
use thiserror::Error;

/// Configuration errors, raised when a ledger is constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("mining unreachable: difficulty {difficulty} exceeds the {max} hex digits of a digest")]
    MiningUnreachable { difficulty: usize, max: usize },

    #[error("mining reward {reward} exceeds the largest balance {max}")]
    RewardTooLarge { reward: u64, max: u64 },
}

/// Largest reward a single block may mint.
pub const MAX_MINING_REWARD: u64 = i64::MAX as u64;

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Required leading zero hex digits for every mined block.
    pub difficulty: usize,
    /// Points minted to the miner of each block.
    pub mining_reward: u64,
    /// Number of trailing blocks used for throughput statistics.
    pub stats_window: usize,
    /// Pending pool settings.
    pub mempool: MempoolConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: 2,
            mining_reward: 10,
            stats_window: 10,
            mempool: MempoolConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Create a configuration with the given difficulty and reward.
    pub fn new(difficulty: usize, mining_reward: u64) -> Self {
        Self {
            difficulty,
            mining_reward,
            ..Self::default()
        }
    }

    /// Check the configuration before a ledger is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::MiningUnreachable {
                difficulty: self.difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        if self.mining_reward > MAX_MINING_REWARD {
            return Err(ConfigError::RewardTooLarge {
                reward: self.mining_reward,
                max: MAX_MINING_REWARD,
            });
        }
        Ok(())
    }
}
