//! Ledger orchestration for ecochain.
//!
//! This crate brings the primitives and the proof-of-work miner together:
//! - **Ledger**: the shared chain handle, balances and history
//! - **Mempool**: pending transactions in arrival order
//! - **Task**: cancellable background mining on tokio
//! - **Stats**: ledger summary and trailing-window statistics
//!
//! # Example
//!
//! ```rust
//! use ecochain_chain::{Ledger, LedgerConfig};
//! use ecochain_core::TransactionKind;
//!
//! let ledger = Ledger::new(LedgerConfig::new(1, 50)).unwrap();
//! ledger
//!     .create_transaction("system", "alice", 50, TransactionKind::Earn, "bike commute")
//!     .unwrap();
//! ledger.mine_block("alice").unwrap();
//!
//! assert_eq!(ledger.balance("alice"), 100);
//! assert!(ledger.is_chain_valid());
//! ```

pub mod config;
pub mod ledger;
pub mod mempool;
pub mod stats;
pub mod task;

// Re-export commonly used types
pub use config::{ConfigError, LedgerConfig, MAX_MINING_REWARD};
pub use ledger::{Ledger, LedgerError, Result};
pub use mempool::{Mempool, MempoolConfig, MempoolError};
pub use stats::{total_supply, LedgerInfo, WindowStats};
pub use task::MiningHandle;
