//! Ledger summary and throughput statistics.
//!
//! Window statistics are rough throughput proxies for dashboards. Balances
//! never depend on them.

use ecochain_core::{Block, Hash, TransactionKind};
use serde::{Deserialize, Serialize};

/// Summary of a ledger at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerInfo {
    /// Number of blocks, genesis included.
    pub total_blocks: usize,
    /// Number of transactions reported by `all_transactions`.
    pub total_transactions: usize,
    /// Result of a full chain validation.
    pub is_valid: bool,
    /// Configured mining difficulty.
    pub difficulty: usize,
    /// Configured reward per block.
    pub mining_reward: u64,
    /// Sum of every `Earn` amount on the chain.
    pub total_supply: u64,
    /// Transactions waiting for the next block.
    pub pending_transactions: usize,
    pub latest_block_index: u64,
    pub latest_block_hash: Hash,
    /// Statistics over the trailing window of mined blocks.
    pub window: WindowStats,
}

/// Trailing-window statistics over mined (non-genesis) blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Number of blocks in the window.
    pub blocks: usize,
    /// Mean proof-of-work nonce.
    pub average_nonce: Option<f64>,
    /// Mean time between consecutive blocks in milliseconds.
    pub average_block_time_ms: Option<f64>,
}

impl WindowStats {
    /// Compute statistics over the last `window` mined blocks of `blocks`.
    ///
    /// Genesis is skipped: its fixed timestamp would swamp the interval mean.
    pub fn from_blocks(blocks: &[Block], window: usize) -> Self {
        let mined: Vec<&Block> = blocks.iter().filter(|b| !b.is_genesis()).collect();
        let recent = &mined[mined.len().saturating_sub(window)..];
        if recent.is_empty() {
            return Self::default();
        }

        let nonce_sum: f64 = recent.iter().map(|b| b.header.nonce as f64).sum();
        let average_nonce = Some(nonce_sum / recent.len() as f64);

        let intervals: Vec<f64> = recent
            .windows(2)
            .map(|pair| pair[1].header.timestamp.saturating_sub(pair[0].header.timestamp) as f64)
            .collect();
        let average_block_time_ms = if intervals.is_empty() {
            None
        } else {
            Some(intervals.iter().sum::<f64>() / intervals.len() as f64)
        };

        Self {
            blocks: recent.len(),
            average_nonce,
            average_block_time_ms,
        }
    }
}

/// Sum of every `Earn` amount on the chain, saturating at `u64::MAX`.
pub fn total_supply(blocks: &[Block]) -> u64 {
    blocks
        .iter()
        .flat_map(|b| &b.transactions)
        .filter(|tx| tx.kind == TransactionKind::Earn)
        .fold(0u64, |total, tx| total.saturating_add(tx.amount))
}
