//! Merkle commitment over an ordered list of transaction digests.
//!
//! Adjacent nodes are paired left to right and hashed as `H(left ‖ right)`.
//! An unpaired trailing node is paired with itself, and reduction always runs
//! at least once, so a single leaf commits to `H(leaf ‖ leaf)`. The empty list
//! commits to [`Hash::ZERO`].

use crate::hash::{hash_concat, Hash};
use crate::transaction::Transaction;

fn parent_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            // Odd count: the last node is its own partner.
            let right = pair.get(1).unwrap_or(left);
            hash_concat(&[left.as_ref(), right.as_ref()])
        })
        .collect()
}

/// Compute the merkle root of a list of hashes.
pub fn merkle_root(hashes: &[Hash]) -> Hash {
    if hashes.is_empty() {
        return Hash::ZERO;
    }

    let mut level = parent_level(hashes);
    while level.len() > 1 {
        level = parent_level(&level);
    }
    level[0]
}

/// Merkle root over the content hashes of `transactions`, in order.
pub fn transactions_root(transactions: &[Transaction]) -> Hash {
    let leaves: Vec<Hash> = transactions.iter().map(|tx| tx.content_hash).collect();
    merkle_root(&leaves)
}

/// A merkle tree kept level by level so inclusion proofs can be produced.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Leaves first, root level last. Empty for an empty tree.
    levels: Vec<Vec<Hash>>,
}

/// Inclusion proof for a single leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Hash,
    /// Sibling hashes from leaf to root.
    pub siblings: Vec<Hash>,
    /// For each sibling, whether the proven node sits on the left of it.
    pub directions: Vec<bool>,
}

impl MerkleTree {
    /// Build a merkle tree from a list of leaf hashes.
    pub fn new(leaves: &[Hash]) -> Self {
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = vec![leaves.to_vec(), parent_level(leaves)];
        while let Some(top) = levels.last().filter(|top| top.len() > 1) {
            let next = parent_level(top);
            levels.push(next);
        }

        Self { levels }
    }

    /// Build a tree over the content hashes of `transactions`.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let leaves: Vec<Hash> = transactions.iter().map(|tx| tx.content_hash).collect();
        Self::new(&leaves)
    }

    /// Get the root of the merkle tree.
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(Hash::ZERO)
    }

    /// Get the number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(Vec::len).unwrap_or(0)
    }

    /// Generate a proof for the leaf at the given index.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaf = *self.levels.first()?.get(index)?;
        let mut siblings = Vec::new();
        let mut directions = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let is_left = idx % 2 == 0;
            let sibling_idx = if is_left { idx + 1 } else { idx - 1 };
            siblings.push(*level.get(sibling_idx).unwrap_or(&level[idx]));
            directions.push(is_left);
            idx /= 2;
        }

        Some(MerkleProof {
            leaf,
            siblings,
            directions,
        })
    }

    /// Verify a merkle proof against this tree's root.
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        verify_proof(&self.root(), proof)
    }
}

/// Verify a merkle proof against a given root.
pub fn verify_proof(root: &Hash, proof: &MerkleProof) -> bool {
    let mut current = proof.leaf;

    for (sibling, is_left) in proof.siblings.iter().zip(&proof.directions) {
        current = if *is_left {
            hash_concat(&[current.as_ref(), sibling.as_ref()])
        } else {
            hash_concat(&[sibling.as_ref(), current.as_ref()])
        };
    }

    current == *root
}
