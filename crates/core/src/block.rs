//! Block and block header structures.
//!
//! A block starts life as a [`BlockTemplate`] (assembled, unhashed), is handed
//! to the miner, and comes back as a sealed [`Block`]. Nothing mutates a
//! `Block` after sealing; the ledger only ever appends them.

use crate::hash::{hash, Hash};
use crate::merkle::transactions_root;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in milliseconds.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// The header of a block. Its encoding is what the block hash commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block index (0 for genesis).
    pub index: u64,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// Hash of the previous block.
    pub prev_hash: Hash,
    /// Merkle root of the transactions, in inclusion order.
    pub merkle_root: Hash,
    /// Required leading zero hex digits of the block hash.
    pub difficulty: usize,
    /// Proof-of-work nonce.
    pub nonce: u64,
}

impl BlockHeader {
    /// Calculate the hash of this block header.
    pub fn compute_hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("serialization should not fail");
        hash(&encoded)
    }
}

/// Hash a block from its parts. The merkle root is derived from
/// `transactions` first, so the hash commits to every transaction.
pub fn compute_hash(
    index: u64,
    timestamp: u64,
    transactions: &[Transaction],
    prev_hash: Hash,
    difficulty: usize,
    nonce: u64,
) -> Hash {
    BlockHeader {
        index,
        timestamp,
        prev_hash,
        merkle_root: transactions_root(transactions),
        difficulty,
        nonce,
    }
    .compute_hash()
}

/// A block candidate that has not been mined yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl BlockTemplate {
    /// Assemble a candidate stamped with the current time.
    pub fn new(
        index: u64,
        prev_hash: Hash,
        transactions: Vec<Transaction>,
        difficulty: usize,
    ) -> Self {
        Self::with_timestamp(index, current_timestamp(), prev_hash, transactions, difficulty)
    }

    /// Assemble a candidate with an explicit timestamp.
    pub fn with_timestamp(
        index: u64,
        timestamp: u64,
        prev_hash: Hash,
        transactions: Vec<Transaction>,
        difficulty: usize,
    ) -> Self {
        Self {
            header: BlockHeader {
                index,
                timestamp,
                prev_hash,
                merkle_root: transactions_root(&transactions),
                difficulty,
                nonce: 0,
            },
            transactions,
        }
    }

    /// Seal the candidate with a nonce found by the miner.
    pub fn seal(mut self, nonce: u64) -> Block {
        self.header.nonce = nonce;
        let hash = self.header.compute_hash();
        Block {
            header: self.header,
            hash,
            transactions: self.transactions,
        }
    }
}

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block header.
    pub header: BlockHeader,
    /// Stored hash of the header.
    pub hash: Hash,
    /// Transactions in inclusion order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create the genesis block. Every ledger starts from this same block.
    pub fn genesis() -> Self {
        BlockTemplate::with_timestamp(0, 0, Hash::ZERO, vec![Transaction::genesis()], 0).seal(0)
    }

    /// Recompute the header hash.
    pub fn compute_hash(&self) -> Hash {
        self.header.compute_hash()
    }

    /// Get the block index.
    pub fn index(&self) -> u64 {
        self.header.index
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.header.index == 0 && self.header.prev_hash == Hash::ZERO
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Verify the stored hash matches the header.
    pub fn verify_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Verify the merkle root matches the transactions.
    pub fn verify_merkle_root(&self) -> bool {
        transactions_root(&self.transactions) == self.header.merkle_root
    }

    /// Check the stored hash against the block's own declared difficulty.
    pub fn meets_difficulty(&self) -> bool {
        self.hash.meets_difficulty(self.header.difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionKind;

    fn sample_txs() -> Vec<Transaction> {
        vec![
            Transaction::create("system", "alice", 50, TransactionKind::Earn, "recycling").unwrap(),
            Transaction::create("alice", "bob", 5, TransactionKind::Transfer, "thanks").unwrap(),
        ]
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();

        assert!(genesis.is_genesis());
        assert_eq!(genesis.index(), 0);
        assert_eq!(genesis.header.prev_hash, Hash::ZERO);
        assert_eq!(genesis.tx_count(), 1);
        assert!(genesis.transactions[0].is_genesis());
        assert!(genesis.verify_hash());
        assert!(genesis.verify_merkle_root());
    }

    #[test]
    fn test_genesis_is_fixed() {
        assert_eq!(Block::genesis(), Block::genesis());
    }

    #[test]
    fn test_block_hash_deterministic() {
        let txs = sample_txs();
        let h1 = compute_hash(1, 1_000, &txs, Hash::ZERO, 2, 42);
        let h2 = compute_hash(1, 1_000, &txs, Hash::ZERO, 2, 42);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_block_hash_commits_to_every_input() {
        let txs = sample_txs();
        let base = compute_hash(1, 1_000, &txs, Hash::ZERO, 2, 42);

        assert_ne!(base, compute_hash(2, 1_000, &txs, Hash::ZERO, 2, 42));
        assert_ne!(base, compute_hash(1, 1_001, &txs, Hash::ZERO, 2, 42));
        assert_ne!(base, compute_hash(1, 1_000, &txs[..1], Hash::ZERO, 2, 42));
        assert_ne!(base, compute_hash(1, 1_000, &txs, hash(b"x"), 2, 42));
        assert_ne!(base, compute_hash(1, 1_000, &txs, Hash::ZERO, 3, 42));
        assert_ne!(base, compute_hash(1, 1_000, &txs, Hash::ZERO, 2, 43));
    }

    #[test]
    fn test_template_seal_matches_compute_hash() {
        let txs = sample_txs();
        let template = BlockTemplate::with_timestamp(1, 5_000, Hash::ZERO, txs.clone(), 1);
        let block = template.seal(7);

        assert_eq!(block.header.nonce, 7);
        assert_eq!(block.hash, compute_hash(1, 5_000, &txs, Hash::ZERO, 1, 7));
        assert!(block.verify_hash());
        assert!(block.verify_merkle_root());
    }

    #[test]
    fn test_merkle_root_verification_detects_tampering() {
        let mut block = BlockTemplate::new(1, Hash::ZERO, sample_txs(), 0).seal(0);
        assert!(block.verify_merkle_root());

        block.transactions.swap(0, 1);
        assert!(!block.verify_merkle_root());
    }

    #[test]
    fn test_empty_block_merkle_root() {
        let block = BlockTemplate::new(1, Hash::ZERO, vec![], 0).seal(0);
        assert!(block.verify_merkle_root());
        assert_eq!(block.header.merkle_root, Hash::ZERO);
    }
}
