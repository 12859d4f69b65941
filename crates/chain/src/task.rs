//! Background mining on the blocking thread pool.

use crate::ledger::{Ledger, LedgerError, Result};
use ecochain_core::Block;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a mining run started with [`Ledger::spawn_mining`].
///
/// Dropping the handle does not stop the run; call [`MiningHandle::cancel`].
#[derive(Debug)]
pub struct MiningHandle {
    token: CancellationToken,
    task: JoinHandle<Result<Block>>,
}

impl MiningHandle {
    /// Ask the miner to stop. It notices within one check interval.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token observed by the miner.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the run has stopped, by sealing a block or by cancellation.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to finish and return the sealed block.
    pub async fn wait(self) -> Result<Block> {
        self.task
            .await
            .map_err(|err| LedgerError::MiningTask(err.to_string()))?
    }
}

impl Ledger {
    /// Start mining the pending pool in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_mining(&self, miner_address: impl Into<String>) -> MiningHandle {
        self.spawn_with_token(miner_address.into(), CancellationToken::new())
    }

    /// Start mining in the background, stopping early when `shutdown` fires.
    ///
    /// The run gets a child of `shutdown`, so cancelling the returned handle
    /// leaves `shutdown` untouched.
    pub fn spawn_mining_with_shutdown(
        &self,
        miner_address: impl Into<String>,
        shutdown: &CancellationToken,
    ) -> MiningHandle {
        self.spawn_with_token(miner_address.into(), shutdown.child_token())
    }

    fn spawn_with_token(&self, miner_address: String, token: CancellationToken) -> MiningHandle {
        let ledger = self.clone();
        let run_token = token.clone();
        let task = tokio::task::spawn_blocking(move || {
            ledger.mine_block_cancellable(&miner_address, &run_token)
        });
        MiningHandle { token, task }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Ledger, LedgerConfig, LedgerError};
    use ecochain_core::TransactionKind;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_spawn_mining_completes() {
        let ledger = Ledger::new(LedgerConfig::new(1, 10)).unwrap();
        ledger
            .create_transaction("system", "alice", 5, TransactionKind::Earn, "x")
            .unwrap();

        let handle = ledger.spawn_mining("miner");
        while !handle.is_finished() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(!handle.token().is_cancelled());
        let block = handle.wait().await.unwrap();

        assert_eq!(block.index(), 1);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_run() {
        let ledger = Ledger::new(LedgerConfig::new(64, 10)).unwrap();
        let shutdown = CancellationToken::new();
        let handle = ledger.spawn_mining_with_shutdown("miner", &shutdown);
        assert!(!handle.is_finished());

        shutdown.cancel();
        assert!(handle.token().is_cancelled());
        let err = handle.wait().await.unwrap_err();

        assert!(matches!(err, LedgerError::MiningCancelled { index: 1, .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelling_handle_leaves_shutdown_alone() {
        let ledger = Ledger::new(LedgerConfig::new(64, 10)).unwrap();
        let shutdown = CancellationToken::new();
        let handle = ledger.spawn_mining_with_shutdown("miner", &shutdown);

        handle.cancel();
        assert!(handle.token().is_cancelled());
        assert!(handle.wait().await.is_err());
        assert!(!shutdown.is_cancelled());
    }
}
