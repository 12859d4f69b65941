//! Pending transaction pool.
//!
//! The pool keeps accepted-but-unmined transactions in arrival order. Mining
//! copies the whole pool, and once the block is sealed exactly that copy is
//! removed again; anything that arrived in between stays for the next block.

use ecochain_core::Transaction;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during mempool operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MempoolError {
    #[error("transaction {0} already in mempool")]
    DuplicateTransaction(String),

    #[error("mempool is full (capacity: {0})")]
    MempoolFull(usize),
}

pub type Result<T> = std::result::Result<T, MempoolError>;

/// Configuration for the mempool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolConfig {
    /// Maximum number of transactions in the mempool.
    pub max_transactions: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 10_000,
        }
    }
}

/// Ordered pool of pending transactions.
#[derive(Debug)]
pub struct Mempool {
    config: MempoolConfig,
    /// Transactions in arrival order.
    transactions: Vec<Transaction>,
    /// Ids of pooled transactions for fast duplicate checks.
    ids: HashSet<String>,
}

impl Mempool {
    /// Create a new mempool with default configuration.
    pub fn new() -> Self {
        Self::with_config(MempoolConfig::default())
    }

    /// Create a new mempool with the given configuration.
    pub fn with_config(config: MempoolConfig) -> Self {
        Self {
            config,
            transactions: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Get the number of transactions in the mempool.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the mempool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Check if a transaction id is in the mempool.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Append a transaction.
    pub fn add(&mut self, tx: Transaction) -> Result<()> {
        if self.contains(&tx.id) {
            return Err(MempoolError::DuplicateTransaction(tx.id));
        }
        if self.transactions.len() >= self.config.max_transactions {
            return Err(MempoolError::MempoolFull(self.config.max_transactions));
        }

        self.ids.insert(tx.id.clone());
        self.transactions.push(tx);
        Ok(())
    }

    /// Copy of the whole pool, in arrival order.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Remove the transactions of a sealed snapshot.
    pub fn remove_sealed(&mut self, sealed: &[Transaction]) {
        let sealed_ids: HashSet<&str> = sealed.iter().map(|tx| tx.id.as_str()).collect();
        self.transactions
            .retain(|tx| !sealed_ids.contains(tx.id.as_str()));
        self.ids.retain(|id| !sealed_ids.contains(id.as_str()));
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}
