//! Proof of Work consensus for ecochain.
//!
//! This crate provides:
//! - Deterministic, cancellable proof-of-work mining
//! - Block validation (hash, work, merkle commitment, parent links)
//! - Whole-chain validation from the fixed genesis block
//!
//! # Example
//!
//! ```rust
//! use ecochain_consensus::{ChainValidator, Miner};
//! use ecochain_core::{Block, BlockTemplate};
//!
//! let genesis = Block::genesis();
//! let template = BlockTemplate::new(1, genesis.hash, vec![], 1);
//! let block = Miner::new(1).unwrap().mine(template);
//!
//! assert!(ChainValidator::is_valid(&[genesis, block], None));
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{check_difficulty, verify_pow, Miner, PowError, CANCEL_CHECK_INTERVAL};
pub use validator::{BlockValidator, ChainValidator, ValidationError};
