//! Block and chain validation rules.
//!
//! Validation never repairs anything. It reports the first rule a block or
//! chain breaks, and the ledger turns that into a validity flag.

use ecochain_core::{Block, SignatureScheme, MAX_DIFFICULTY};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("chain has no blocks")]
    EmptyChain,

    #[error("first block is not the genesis block")]
    InvalidGenesis,

    #[error("block index mismatch (expected {expected}, got {got})")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("block {index}: prev_hash does not match the previous block")]
    InvalidPrevHash { index: u64 },

    #[error("block {index}: stored hash does not match its contents")]
    HashMismatch { index: u64 },

    #[error("block {index}: hash does not meet difficulty {difficulty}")]
    InsufficientWork { index: u64, difficulty: usize },

    #[error("block {index}: declared difficulty {difficulty} is unreachable")]
    UnreachableDifficulty { index: u64, difficulty: usize },

    #[error("block {index}: merkle root verification failed")]
    InvalidMerkleRoot { index: u64 },

    #[error("block {index}: transaction {tx_id} content hash mismatch")]
    ContentHashMismatch { index: u64, tx_id: String },

    #[error("block {index}: transaction {tx_id} appears twice")]
    DuplicateTransaction { index: u64, tx_id: String },

    #[error("block {index}: transaction {tx_id} signature verification failed")]
    InvalidSignature { index: u64, tx_id: String },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Validate transactions and their merkle commitment.
    pub fn validate_block_structure(block: &Block) -> Result<()> {
        let index = block.index();
        let mut seen = HashSet::new();
        for tx in &block.transactions {
            if !tx.verify_content_hash() {
                return Err(ValidationError::ContentHashMismatch {
                    index,
                    tx_id: tx.id.clone(),
                });
            }
            if !seen.insert(tx.id.as_str()) {
                return Err(ValidationError::DuplicateTransaction {
                    index,
                    tx_id: tx.id.clone(),
                });
            }
        }

        if !block.verify_merkle_root() {
            return Err(ValidationError::InvalidMerkleRoot { index });
        }

        Ok(())
    }

    /// Validate the stored hash and its proof of work.
    pub fn validate_pow(block: &Block) -> Result<()> {
        let index = block.index();
        let difficulty = block.header.difficulty;

        if difficulty > MAX_DIFFICULTY {
            return Err(ValidationError::UnreachableDifficulty { index, difficulty });
        }
        if !block.verify_hash() {
            return Err(ValidationError::HashMismatch { index });
        }
        if !block.meets_difficulty() {
            return Err(ValidationError::InsufficientWork { index, difficulty });
        }

        Ok(())
    }

    /// Validate block extends the parent correctly.
    pub fn validate_block_extends_parent(block: &Block, parent: &Block) -> Result<()> {
        let expected = parent.index() + 1;
        if block.index() != expected {
            return Err(ValidationError::InvalidIndex {
                expected,
                got: block.index(),
            });
        }

        if block.header.prev_hash != parent.hash {
            return Err(ValidationError::InvalidPrevHash {
                index: block.index(),
            });
        }

        Ok(())
    }

    /// Verify every signed transaction in the block. Unsigned ones pass.
    pub fn validate_signatures(block: &Block, verifier: &dyn SignatureScheme) -> Result<()> {
        for tx in block.transactions.iter().filter(|tx| tx.signature.is_some()) {
            if tx.verify_signature(verifier).is_err() {
                return Err(ValidationError::InvalidSignature {
                    index: block.index(),
                    tx_id: tx.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Full block validation (hash, work, parent link, transactions).
    pub fn validate_full(
        block: &Block,
        parent: &Block,
        verifier: Option<&dyn SignatureScheme>,
    ) -> Result<()> {
        Self::validate_pow(block)?;
        Self::validate_block_extends_parent(block, parent)?;
        Self::validate_block_structure(block)?;
        if let Some(verifier) = verifier {
            Self::validate_signatures(block, verifier)?;
        }
        Ok(())
    }
}

/// Whole-chain validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Validate a chain from genesis to tip.
    ///
    /// The first block must be the fixed genesis block; every later block is
    /// checked against its predecessor with [`BlockValidator::validate_full`].
    pub fn validate_chain(blocks: &[Block], verifier: Option<&dyn SignatureScheme>) -> Result<()> {
        let genesis = blocks.first().ok_or(ValidationError::EmptyChain)?;
        if *genesis != Block::genesis() {
            return Err(ValidationError::InvalidGenesis);
        }

        for pair in blocks.windows(2) {
            BlockValidator::validate_full(&pair[1], &pair[0], verifier)?;
        }

        Ok(())
    }

    /// Boolean form of [`ChainValidator::validate_chain`].
    pub fn is_valid(blocks: &[Block], verifier: Option<&dyn SignatureScheme>) -> bool {
        match Self::validate_chain(blocks, verifier) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "chain validation failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::Miner;
    use ecochain_core::{
        BlockTemplate, Ed25519Identity, Ed25519Verifier, Hash, Transaction, TransactionKind,
    };

    fn earn(to: &str, amount: i64) -> Transaction {
        Transaction::create("system", to, amount, TransactionKind::Earn, "eco action").unwrap()
    }

    fn next_block(parent: &Block, txs: Vec<Transaction>) -> Block {
        let template = BlockTemplate::new(parent.index() + 1, parent.hash, txs, 2);
        Miner::new(2).unwrap().mine(template)
    }

    fn chain(len: usize) -> Vec<Block> {
        let mut blocks = vec![Block::genesis()];
        for i in 1..len {
            let parent = blocks.last().unwrap();
            let block = next_block(parent, vec![earn("alice", i as i64)]);
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn test_genesis_only_chain_is_valid() {
        assert!(ChainValidator::validate_chain(&[Block::genesis()], None).is_ok());
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert_eq!(
            ChainValidator::validate_chain(&[], None),
            Err(ValidationError::EmptyChain)
        );
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let blocks = chain(4);
        assert!(ChainValidator::validate_chain(&blocks, None).is_ok());
        assert!(ChainValidator::is_valid(&blocks, None));
    }

    #[test]
    fn test_tampered_genesis_rejected() {
        let mut blocks = chain(2);
        blocks[0].transactions[0].label = "forged".into();
        assert_eq!(
            ChainValidator::validate_chain(&blocks, None),
            Err(ValidationError::InvalidGenesis)
        );
    }

    #[test]
    fn test_block_merkle_root_validation() {
        let blocks = chain(2);
        let mut bad = blocks[1].clone();
        bad.header.merkle_root = Hash::ZERO;

        // The header changed, so the stored hash no longer matches first.
        assert_eq!(
            BlockValidator::validate_pow(&bad),
            Err(ValidationError::HashMismatch { index: 1 })
        );
        assert_eq!(
            BlockValidator::validate_block_structure(&bad),
            Err(ValidationError::InvalidMerkleRoot { index: 1 })
        );
    }

    #[test]
    fn test_tampered_transaction_detected() {
        let mut blocks = chain(3);
        blocks[1].transactions[0].amount = 1_000_000;
        assert!(matches!(
            ChainValidator::validate_chain(&blocks, None),
            Err(ValidationError::ContentHashMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_transaction_rejected() {
        let tx = earn("alice", 5);
        let block = next_block(&Block::genesis(), vec![tx.clone(), tx]);
        assert!(matches!(
            BlockValidator::validate_block_structure(&block),
            Err(ValidationError::DuplicateTransaction { index: 1, .. })
        ));
    }

    #[test]
    fn test_block_extends_parent() {
        let blocks = chain(3);

        assert!(BlockValidator::validate_block_extends_parent(&blocks[2], &blocks[1]).is_ok());
        assert_eq!(
            BlockValidator::validate_block_extends_parent(&blocks[2], &blocks[0]),
            Err(ValidationError::InvalidIndex {
                expected: 1,
                got: 2
            })
        );

        let mut orphan = blocks[2].clone();
        orphan.header.prev_hash = Hash::ZERO;
        assert_eq!(
            BlockValidator::validate_block_extends_parent(&orphan, &blocks[1]),
            Err(ValidationError::InvalidPrevHash { index: 2 })
        );
    }

    #[test]
    fn test_insufficient_work_detected() {
        let parent = Block::genesis();
        // Seal without mining: take the first nonce that misses the target.
        let template = BlockTemplate::new(1, parent.hash, vec![earn("bob", 1)], 2);
        let mut nonce = 0;
        let block = loop {
            let candidate = template.clone().seal(nonce);
            if !candidate.meets_difficulty() {
                break candidate;
            }
            nonce += 1;
        };
        assert_eq!(
            BlockValidator::validate_pow(&block),
            Err(ValidationError::InsufficientWork {
                index: 1,
                difficulty: 2
            })
        );
    }

    #[test]
    fn test_signatures_checked_when_verifier_given() {
        let identity = Ed25519Identity::generate();
        let signed = earn("alice", 3).signed(&identity);
        let mut forged = earn("mallory", 3);
        forged.signature = signed.signature.clone();

        let good = next_block(&Block::genesis(), vec![signed]);
        assert!(BlockValidator::validate_full(&good, &Block::genesis(), Some(&identity)).is_ok());

        let bad = next_block(&Block::genesis(), vec![forged]);
        assert!(BlockValidator::validate_full(&bad, &Block::genesis(), None).is_ok());
        assert!(matches!(
            BlockValidator::validate_full(&bad, &Block::genesis(), Some(&identity)),
            Err(ValidationError::InvalidSignature { index: 1, .. })
        ));
    }

    #[test]
    fn test_flipped_signature_byte_rejected() {
        let identity = Ed25519Identity::generate();
        let mut tx = earn("alice", 3).signed(&identity);
        if let Some(sig) = tx.signature.as_mut() {
            sig.signature.0[0] ^= 0x01;
        }

        let block = next_block(&Block::genesis(), vec![tx]);
        assert!(matches!(
            ChainValidator::validate_chain(&[Block::genesis(), block], Some(&Ed25519Verifier)),
            Err(ValidationError::InvalidSignature { index: 1, .. })
        ));
    }
}
