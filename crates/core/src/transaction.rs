//! Transaction types and signing.

use crate::block::current_timestamp;
use crate::crypto::{PublicKey, Signature, SignatureScheme, SigningIdentity};
use crate::hash::{hash, Hash};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Account that mints rewards and receives spends.
pub const SYSTEM_ADDRESS: &str = "system";

/// Recipient of the genesis sentinel transaction.
pub const GENESIS_ADDRESS: &str = "genesis";

/// Id of the genesis sentinel transaction.
pub const GENESIS_TX_ID: &str = "genesis";

/// Label carried by mining reward transactions.
pub const REWARD_LABEL: &str = "Mining Reward";

/// Errors that can occur during transaction operations.
///
/// `NegativeAmount` and `MissingAddress` make up the invalid-transaction
/// class: such transactions are rejected at creation and never reach a pool.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("invalid transaction: negative amount {0}")]
    NegativeAmount(i64),
    #[error("invalid transaction: missing {0} address")]
    MissingAddress(&'static str),
    #[error("missing signature")]
    MissingSignature,
    #[error("signature verification failed")]
    VerificationFailed,
}

impl TransactionError {
    /// Whether this error means the transaction itself is malformed.
    pub fn is_invalid_transaction(&self) -> bool {
        matches!(self, Self::NegativeAmount(_) | Self::MissingAddress(_))
    }
}

pub type Result<T> = std::result::Result<T, TransactionError>;

/// What a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Points earned for an eco action (or minted as a reward).
    Earn,
    /// Points redeemed.
    Spend,
    /// Points moved between two users.
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Earn => "EARN",
            Self::Spend => "SPEND",
            Self::Transfer => "TRANSFER",
        };
        f.write_str(s)
    }
}

/// A signature together with the key that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub signer: PublicKey,
    pub signature: Signature,
}

/// A ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Random identifier, independent of content.
    pub id: String,
    /// Debited address.
    pub from: String,
    /// Credited address.
    pub to: String,
    /// Number of points moved.
    pub amount: u64,
    pub kind: TransactionKind,
    /// Free text describing the action.
    pub label: String,
    /// Unix timestamp in milliseconds.
    pub created_at: u64,
    /// Digest of the canonical payload.
    pub content_hash: Hash,
    /// Optional signature over `content_hash`.
    pub signature: Option<TransactionSignature>,
}

/// Canonical field ordering used for hashing. Field order here is the
/// encoding order; changing it changes every content hash.
#[derive(Serialize)]
struct CanonicalPayload<'a> {
    id: &'a str,
    from: &'a str,
    to: &'a str,
    amount: u64,
    kind: TransactionKind,
    label: &'a str,
    created_at: u64,
}

impl Transaction {
    /// Create a new validated transaction stamped with the current time.
    pub fn create(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: i64,
        kind: TransactionKind,
        label: impl Into<String>,
    ) -> Result<Self> {
        let from = from.into();
        let to = to.into();
        if amount < 0 {
            return Err(TransactionError::NegativeAmount(amount));
        }
        Self::check_addresses(&from, &to)?;

        Ok(Self::build(
            random_id(),
            from,
            to,
            amount as u64,
            kind,
            label.into(),
            current_timestamp(),
        ))
    }

    /// Create the reward paid to `miner` for sealing a block.
    pub fn reward(miner: impl Into<String>, amount: u64) -> Result<Self> {
        let miner = miner.into();
        Self::check_addresses(SYSTEM_ADDRESS, &miner)?;
        Ok(Self::build(
            random_id(),
            SYSTEM_ADDRESS.to_string(),
            miner,
            amount,
            TransactionKind::Earn,
            REWARD_LABEL.to_string(),
            current_timestamp(),
        ))
    }

    /// The sentinel transaction carried by the genesis block.
    pub fn genesis() -> Self {
        Self::build(
            GENESIS_TX_ID.to_string(),
            SYSTEM_ADDRESS.to_string(),
            GENESIS_ADDRESS.to_string(),
            0,
            TransactionKind::Earn,
            "Genesis Block".to_string(),
            0,
        )
    }

    fn build(
        id: String,
        from: String,
        to: String,
        amount: u64,
        kind: TransactionKind,
        label: String,
        created_at: u64,
    ) -> Self {
        let mut tx = Self {
            id,
            from,
            to,
            amount,
            kind,
            label,
            created_at,
            content_hash: Hash::ZERO,
            signature: None,
        };
        tx.content_hash = tx.compute_content_hash();
        tx
    }

    fn check_addresses(from: &str, to: &str) -> Result<()> {
        if from.trim().is_empty() {
            return Err(TransactionError::MissingAddress("sender"));
        }
        if to.trim().is_empty() {
            return Err(TransactionError::MissingAddress("recipient"));
        }
        Ok(())
    }

    /// Recompute the content hash from the current fields.
    pub fn compute_content_hash(&self) -> Hash {
        let payload = CanonicalPayload {
            id: &self.id,
            from: &self.from,
            to: &self.to,
            amount: self.amount,
            kind: self.kind,
            label: &self.label,
            created_at: self.created_at,
        };
        let encoded = bincode::serialize(&payload).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Check that the stored content hash matches the fields.
    pub fn verify_content_hash(&self) -> bool {
        self.compute_content_hash() == self.content_hash
    }

    /// Sign the content hash with the given identity.
    pub fn signed(mut self, identity: &dyn SigningIdentity) -> Self {
        self.signature = Some(TransactionSignature {
            signer: identity.public_key(),
            signature: identity.sign(self.content_hash.as_bytes()),
        });
        self
    }

    /// Verify the attached signature. `verifier` supplies the scheme.
    pub fn verify_signature(&self, verifier: &dyn SignatureScheme) -> Result<()> {
        let sig = self
            .signature
            .as_ref()
            .ok_or(TransactionError::MissingSignature)?;
        if verifier.verify(&sig.signer, self.content_hash.as_bytes(), &sig.signature) {
            Ok(())
        } else {
            Err(TransactionError::VerificationFailed)
        }
    }

    /// Check if this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        self.id == GENESIS_TX_ID && self.from == SYSTEM_ADDRESS && self.to == GENESIS_ADDRESS
    }

    /// Check if this transaction was minted by the system account.
    pub fn is_reward(&self) -> bool {
        self.from == SYSTEM_ADDRESS && self.kind == TransactionKind::Earn && !self.is_genesis()
    }

    /// Check if this transaction credits or debits `address`.
    pub fn touches(&self, address: &str) -> bool {
        self.from == address || self.to == address
    }
}

fn random_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
