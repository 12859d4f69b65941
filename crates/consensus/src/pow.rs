//! Proof of Work mining.
//!
//! The miner walks nonces upward from 0 and stops at the first header hash
//! with at least `difficulty` leading zero hex digits. There is no randomness
//! anywhere in the search, so the same template always yields the same nonce.

use ecochain_core::{Block, BlockHeader, BlockTemplate, Hash, Transaction, MAX_DIFFICULTY};
use std::convert::Infallible;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How many nonces are tried between two cancellation checks.
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Errors that can occur during proof-of-work operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("difficulty {difficulty} is unreachable (a digest has {max} hex digits)")]
    Unreachable { difficulty: usize, max: usize },

    #[error("mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
}

pub type Result<T> = std::result::Result<T, PowError>;

/// Reject a difficulty no digest can satisfy.
pub fn check_difficulty(difficulty: usize) -> Result<()> {
    if difficulty > MAX_DIFFICULTY {
        return Err(PowError::Unreachable {
            difficulty,
            max: MAX_DIFFICULTY,
        });
    }
    Ok(())
}

/// Brute-force nonce search over `header`, leaving the winning nonce in it.
///
/// `interrupt` is consulted with the current nonce every
/// [`CANCEL_CHECK_INTERVAL`] attempts, starting before the first one.
fn search<E>(
    header: &mut BlockHeader,
    mut interrupt: impl FnMut(u64) -> std::result::Result<(), E>,
) -> std::result::Result<Hash, E> {
    header.nonce = 0;
    loop {
        if header.nonce % CANCEL_CHECK_INTERVAL == 0 {
            interrupt(header.nonce)?;
        }
        let hash = header.compute_hash();
        if hash.meets_difficulty(header.difficulty) {
            return Ok(hash);
        }
        header.nonce = header.nonce.wrapping_add(1);
    }
}

/// Proof-of-work miner for a fixed difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Miner {
    difficulty: usize,
}

impl Miner {
    /// Create a miner. Fails for a difficulty above [`MAX_DIFFICULTY`].
    pub fn new(difficulty: usize) -> Result<Self> {
        check_difficulty(difficulty)?;
        Ok(Self { difficulty })
    }

    /// Required leading zero hex digits.
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Mine `template` to completion.
    pub fn mine(&self, template: BlockTemplate) -> Block {
        let mut header = self.prepare(template.header);
        let hash = match search(&mut header, |_| Ok::<(), Infallible>(())) {
            Ok(hash) => hash,
            Err(never) => match never {},
        };
        Self::finish(header, hash, template.transactions)
    }

    /// Mine `template` until a nonce is found or `token` is cancelled.
    ///
    /// A cancelled search returns [`PowError::Cancelled`] and drops the
    /// candidate; nothing outside this call observes it.
    pub fn mine_cancellable(
        &self,
        template: BlockTemplate,
        token: &CancellationToken,
    ) -> Result<Block> {
        let mut header = self.prepare(template.header);
        let index = header.index;
        let hash = search(&mut header, |nonce| {
            if token.is_cancelled() {
                tracing::debug!(index, nonce, "mining cancelled");
                return Err(PowError::Cancelled { attempts: nonce });
            }
            Ok(())
        })?;
        Ok(Self::finish(header, hash, template.transactions))
    }

    fn prepare(&self, mut header: BlockHeader) -> BlockHeader {
        header.difficulty = self.difficulty;
        header
    }

    fn finish(header: BlockHeader, hash: Hash, transactions: Vec<Transaction>) -> Block {
        Block {
            header,
            hash,
            transactions,
        }
    }
}

/// Check a sealed block's hash against its own declared difficulty.
pub fn verify_pow(block: &Block) -> bool {
    block.hash == block.compute_hash() && block.meets_difficulty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecochain_core::TransactionKind;

    fn template(difficulty: usize) -> BlockTemplate {
        let tx = Transaction::create("system", "alice", 50, TransactionKind::Earn, "recycling").unwrap();
        BlockTemplate::with_timestamp(1, 1_700_000_000_000, Hash::ZERO, vec![tx], difficulty)
    }

    #[test]
    fn test_unreachable_difficulty_rejected() {
        assert_eq!(
            Miner::new(MAX_DIFFICULTY + 1),
            Err(PowError::Unreachable {
                difficulty: 65,
                max: 64
            })
        );
        assert!(Miner::new(MAX_DIFFICULTY).is_ok());
    }

    #[test]
    fn test_mined_block_meets_difficulty() {
        let miner = Miner::new(2).unwrap();
        let block = miner.mine(template(2));

        assert!(block.hash.to_hex().starts_with("00"));
        assert!(verify_pow(&block));
        assert!(block.verify_merkle_root());
    }

    #[test]
    fn test_mining_is_deterministic() {
        let miner = Miner::new(2).unwrap();
        let t = template(2);
        let a = miner.mine(t.clone());
        let b = miner.mine(t);

        assert_eq!(a.header.nonce, b.header.nonce);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn test_first_satisfying_nonce_is_chosen() {
        let miner = Miner::new(1).unwrap();
        let t = template(1);
        let block = miner.mine(t.clone());

        for nonce in 0..block.header.nonce {
            let mut header = t.header.clone();
            header.difficulty = 1;
            header.nonce = nonce;
            assert!(!header.compute_hash().meets_difficulty(1));
        }
    }

    #[test]
    fn test_zero_difficulty_takes_nonce_zero() {
        let block = Miner::new(0).unwrap().mine(template(0));
        assert_eq!(block.header.nonce, 0);
        assert!(verify_pow(&block));
    }

    #[test]
    fn test_miner_overrides_template_difficulty() {
        let block = Miner::new(1).unwrap().mine(template(5));
        assert_eq!(block.header.difficulty, 1);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let result = Miner::new(8).unwrap().mine_cancellable(template(8), &token);
        assert_eq!(result, Err(PowError::Cancelled { attempts: 0 }));
    }

    #[test]
    fn test_cancellable_matches_plain_mining() {
        let miner = Miner::new(2).unwrap();
        let t = template(2);
        let a = miner.mine_cancellable(t.clone(), &CancellationToken::new()).unwrap();
        let b = miner.mine(t);
        assert_eq!(a, b);
    }

    #[test]
    fn test_verify_pow_rejects_tampered_nonce() {
        let mut block = Miner::new(2).unwrap().mine(template(2));
        block.header.nonce += 1;
        assert!(!verify_pow(&block));
    }
}
