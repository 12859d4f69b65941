//! The ledger: an append-only chain of mined blocks plus the pending pool.
//!
//! `Ledger` is a cheap handle; clones share the same chain. The chain lives
//! behind an `Arc` that is replaced copy-on-append, so every read works on a
//! consistent snapshot and never sees a half-appended block. Mining is the
//! only writer and is serialized by its own lock; the pool lock is held just
//! long enough to copy the pool and, after sealing, to drop what was sealed.

use crate::config::{ConfigError, LedgerConfig};
use crate::mempool::{Mempool, MempoolError};
use crate::stats::{total_supply, LedgerInfo, WindowStats};
use ecochain_consensus::{ChainValidator, Miner, PowError, ValidationError};
use ecochain_core::{
    verify_proof, Block, BlockTemplate, Ed25519Verifier, MerkleProof, MerkleTree,
    SignatureScheme, SigningIdentity, Transaction, TransactionError, TransactionKind,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("mempool error: {0}")]
    Mempool(#[from] MempoolError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("mining of block {index} cancelled after {attempts} attempts")]
    MiningCancelled { index: u64, attempts: u64 },

    #[error("mining task failed: {0}")]
    MiningTask(String),

    #[error("a ledger needs at least the genesis block")]
    EmptyChain,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

// Every critical section leaves its data consistent, so a poisoned lock is
// still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct LedgerInner {
    config: LedgerConfig,
    miner: Miner,
    chain: RwLock<Arc<Vec<Block>>>,
    pool: Mutex<Mempool>,
    /// Held for the whole of a mining run.
    writer: Mutex<()>,
    identity: Option<Arc<dyn SigningIdentity>>,
    /// Checks every attached signature during chain validation.
    verifier: Arc<dyn SignatureScheme>,
}

/// Handle to an in-process ledger.
#[derive(Clone)]
pub struct Ledger {
    inner: Arc<LedgerInner>,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        Self::build(config, vec![Block::genesis()], None, Arc::new(Ed25519Verifier))
    }

    /// Create a ledger that signs every transaction it creates.
    ///
    /// Signatures on the chain are checked with the identity's own scheme.
    pub fn with_identity<I>(config: LedgerConfig, identity: Arc<I>) -> Result<Self>
    where
        I: SigningIdentity + 'static,
    {
        let verifier: Arc<dyn SignatureScheme> = identity.clone();
        let identity: Arc<dyn SigningIdentity> = identity;
        Self::build(config, vec![Block::genesis()], Some(identity), verifier)
    }

    /// Adopt an existing chain as is, e.g. one exported from another ledger.
    ///
    /// The chain is not validated here; `is_chain_valid` reports on it.
    /// Attached signatures are checked as Ed25519.
    pub fn from_chain(config: LedgerConfig, blocks: Vec<Block>) -> Result<Self> {
        Self::from_chain_with_verifier(config, blocks, Arc::new(Ed25519Verifier))
    }

    /// Like [`Ledger::from_chain`], checking signatures with `verifier`.
    pub fn from_chain_with_verifier(
        config: LedgerConfig,
        blocks: Vec<Block>,
        verifier: Arc<dyn SignatureScheme>,
    ) -> Result<Self> {
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        Self::build(config, blocks, None, verifier)
    }

    fn build(
        config: LedgerConfig,
        blocks: Vec<Block>,
        identity: Option<Arc<dyn SigningIdentity>>,
        verifier: Arc<dyn SignatureScheme>,
    ) -> Result<Self> {
        config.validate()?;
        let miner = Miner::new(config.difficulty)
            .map_err(|err| LedgerError::MiningTask(err.to_string()))?;
        let pool = Mempool::with_config(config.mempool.clone());

        Ok(Self {
            inner: Arc::new(LedgerInner {
                config,
                miner,
                chain: RwLock::new(Arc::new(blocks)),
                pool: Mutex::new(pool),
                writer: Mutex::new(()),
                identity,
                verifier,
            }),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.inner.config
    }

    // =========================================================================
    // Pending pool
    // =========================================================================

    /// Create a transaction and queue it for the next block.
    pub fn create_transaction(
        &self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: i64,
        kind: TransactionKind,
        label: impl Into<String>,
    ) -> Result<Transaction> {
        let tx = self.sign(Transaction::create(from, to, amount, kind, label)?);
        self.append_pending(tx.clone())?;
        Ok(tx)
    }

    /// Queue an already created transaction.
    pub fn append_pending(&self, tx: Transaction) -> Result<()> {
        let id = tx.id.clone();
        let pending = {
            let mut pool = lock(&self.inner.pool);
            pool.add(tx)?;
            pool.len()
        };
        tracing::debug!(%id, pending, "transaction queued");
        Ok(())
    }

    /// Transactions waiting for the next block, in arrival order.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        lock(&self.inner.pool).snapshot()
    }

    /// Number of transactions waiting for the next block.
    pub fn pending_count(&self) -> usize {
        lock(&self.inner.pool).len()
    }

    fn sign(&self, tx: Transaction) -> Transaction {
        match &self.inner.identity {
            Some(identity) => tx.signed(identity.as_ref()),
            None => tx,
        }
    }

    // =========================================================================
    // Mining
    // =========================================================================

    /// Mine the pending pool into a new block, paying `miner_address`.
    pub fn mine_block(&self, miner_address: &str) -> Result<Block> {
        self.mine_block_cancellable(miner_address, &CancellationToken::new())
    }

    /// Mine the pending pool into a new block unless `token` is cancelled.
    ///
    /// The pool is copied when mining starts and the reward transaction is
    /// appended to that copy. Transactions submitted while the search runs
    /// stay pending for the next block. On cancellation the candidate is
    /// dropped and neither the chain nor the pool changes.
    pub fn mine_block_cancellable(
        &self,
        miner_address: &str,
        token: &CancellationToken,
    ) -> Result<Block> {
        let _writer = lock(&self.inner.writer);

        let reward = self.sign(Transaction::reward(
            miner_address,
            self.inner.config.mining_reward,
        )?);
        let (index, prev_hash) = {
            let chain = self.blocks();
            let tip = chain.last().ok_or(LedgerError::EmptyChain)?;
            (chain.len() as u64, tip.hash)
        };
        let snapshot = lock(&self.inner.pool).snapshot();

        let mut transactions = snapshot.clone();
        transactions.push(reward);
        let template =
            BlockTemplate::new(index, prev_hash, transactions, self.inner.config.difficulty);

        let started = Instant::now();
        let block = self
            .inner
            .miner
            .mine_cancellable(template, token)
            .map_err(|err| match err {
                PowError::Cancelled { attempts } => LedgerError::MiningCancelled { index, attempts },
                other => LedgerError::MiningTask(other.to_string()),
            })?;

        self.seal(block.clone(), &snapshot);
        tracing::info!(
            index,
            nonce = block.header.nonce,
            hash = %block.hash,
            txs = block.tx_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "block mined"
        );
        Ok(block)
    }

    /// Append a mined block and drop its transactions from the pool in one step.
    fn seal(&self, block: Block, snapshot: &[Transaction]) {
        let mut pool = lock(&self.inner.pool);
        let mut chain = self
            .inner
            .chain
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut *chain).push(block);
        pool.remove_sealed(snapshot);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Consistent snapshot of the whole chain.
    pub fn blocks(&self) -> Arc<Vec<Block>> {
        self.inner
            .chain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks().len()
    }

    /// Always false: a ledger holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks().is_empty()
    }

    /// Get the latest block.
    pub fn latest_block(&self) -> Option<Block> {
        self.blocks().last().cloned()
    }

    /// Get a block by index.
    pub fn block(&self, index: u64) -> Option<Block> {
        let index = usize::try_from(index).ok()?;
        self.blocks().get(index).cloned()
    }

    /// Derive the balance of `address` from every sealed transaction.
    ///
    /// Credits when `to == address`, debits when `from == address`. The
    /// result is not clamped and goes negative after an overspend.
    pub fn balance(&self, address: &str) -> i64 {
        self.blocks()
            .iter()
            .flat_map(|block| &block.transactions)
            .fold(0i64, |balance, tx| {
                let amount = i64::try_from(tx.amount).unwrap_or(i64::MAX);
                let mut balance = balance;
                if tx.to == address {
                    balance = balance.saturating_add(amount);
                }
                if tx.from == address {
                    balance = balance.saturating_sub(amount);
                }
                balance
            })
    }

    /// Every sealed transaction in chain order.
    ///
    /// The genesis sentinel is left out; mining rewards are kept since they
    /// are real issuance.
    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.blocks()
            .iter()
            .flat_map(|block| &block.transactions)
            .filter(|tx| !tx.is_genesis())
            .cloned()
            .collect()
    }

    /// Sealed transactions that credit or debit `address`, in chain order.
    pub fn history(&self, address: &str) -> Vec<Transaction> {
        self.all_transactions()
            .into_iter()
            .filter(|tx| tx.touches(address))
            .collect()
    }

    /// Validate the chain, naming the first broken rule.
    pub fn validate_chain(&self) -> std::result::Result<(), ValidationError> {
        ChainValidator::validate_chain(&self.blocks(), Some(self.inner.verifier.as_ref()))
    }

    /// Check the whole chain. Integrity problems only ever show up here.
    pub fn is_chain_valid(&self) -> bool {
        ChainValidator::is_valid(&self.blocks(), Some(self.inner.verifier.as_ref()))
    }

    /// Locate a sealed transaction and prove it is committed by its block.
    ///
    /// Returns the block index and a proof against that block's merkle root.
    pub fn inclusion_proof(&self, tx_id: &str) -> Option<(u64, MerkleProof)> {
        let blocks = self.blocks();
        blocks.iter().find_map(|block| {
            let position = block.transactions.iter().position(|tx| tx.id == tx_id)?;
            let proof = MerkleTree::from_transactions(&block.transactions).proof(position)?;
            Some((block.index(), proof))
        })
    }

    /// Check `proof` against the merkle root stored in block `index`.
    pub fn verify_inclusion(&self, index: u64, proof: &MerkleProof) -> bool {
        self.block(index)
            .map(|block| verify_proof(&block.header.merkle_root, proof))
            .unwrap_or(false)
    }

    /// Summarize the ledger for dashboards.
    pub fn info(&self) -> LedgerInfo {
        let blocks = self.blocks();
        let config = &self.inner.config;
        let (latest_block_index, latest_block_hash) = blocks
            .last()
            .map(|b| (b.index(), b.hash))
            .unwrap_or_default();

        LedgerInfo {
            total_blocks: blocks.len(),
            total_transactions: blocks
                .iter()
                .flat_map(|block| &block.transactions)
                .filter(|tx| !tx.is_genesis())
                .count(),
            is_valid: ChainValidator::is_valid(&blocks, Some(self.inner.verifier.as_ref())),
            difficulty: config.difficulty,
            mining_reward: config.mining_reward,
            total_supply: total_supply(&blocks),
            pending_transactions: self.pending_count(),
            latest_block_index,
            latest_block_hash,
            window: WindowStats::from_blocks(&blocks, config.stats_window),
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("blocks", &self.len())
            .field("pending", &self.pending_count())
            .field("config", &self.inner.config)
            .finish()
    }
}
