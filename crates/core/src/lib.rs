//! Core ledger primitives for ecochain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - SHA-256 hashing and difficulty checks
//! - Transactions (earn, spend, transfer)
//! - Merkle commitment over transactions
//! - Blocks, block templates and block hashing
//! - The injectable signing identity

pub mod block;
pub mod crypto;
pub mod hash;
pub mod merkle;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{compute_hash, current_timestamp, Block, BlockHeader, BlockTemplate};
pub use crypto::{
    CryptoError, Ed25519Identity, Ed25519Verifier, PublicKey, Signature, SignatureScheme,
    SigningIdentity,
};
pub use hash::{hash, hash_concat, Hash, H256, MAX_DIFFICULTY};
pub use merkle::{merkle_root, transactions_root, verify_proof, MerkleProof, MerkleTree};
pub use transaction::{
    Transaction, TransactionError, TransactionKind, TransactionSignature, GENESIS_ADDRESS,
    REWARD_LABEL, SYSTEM_ADDRESS,
};
