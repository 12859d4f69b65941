//! Signing identity integration point.
//!
//! The ledger never builds a wallet itself. A host that wants signed
//! transactions injects something implementing [`SigningIdentity`]; an
//! Ed25519 implementation is provided for hosts without their own.
//! Checking signatures needs only a [`SignatureScheme`], so a chain can be
//! verified by a process that holds no key.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid signature length: {0} bytes")]
    InvalidSignature(usize),
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid hex encoding")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Encoded public key of a signer. The encoding is owned by the scheme.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub Vec<u8>);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Ok(Self(hex::decode(s.strip_prefix("0x").unwrap_or(s))?))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "PublicKey({})", &hex[..hex.len().min(16)])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Raw signature bytes produced by a [`SigningIdentity`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Signature({}...)", &hex[..hex.len().min(16)])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Signature checking, independent of any secret key.
///
/// Implementations must be deterministic.
pub trait SignatureScheme: Send + Sync {
    /// Check `signature` over `message` against `public_key`.
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool;
}

/// Capability to sign payloads. The matching [`SignatureScheme`] must accept
/// every signature `sign` produces.
pub trait SigningIdentity: SignatureScheme {
    /// Public key of this identity.
    fn public_key(&self) -> PublicKey;

    /// Sign a message.
    fn sign(&self, message: &[u8]) -> Signature;
}

/// Ed25519 signature checking. Malformed keys or signatures fail closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    fn verifying_key(public_key: &PublicKey) -> Result<VerifyingKey, CryptoError> {
        let bytes: [u8; 32] = public_key
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)
    }

    fn dalek_signature(signature: &Signature) -> Result<DalekSignature, CryptoError> {
        let bytes: [u8; 64] = signature
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature(signature.as_bytes().len()))?;
        Ok(DalekSignature::from_bytes(&bytes))
    }
}

impl SignatureScheme for Ed25519Verifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        let (Ok(key), Ok(sig)) = (
            Self::verifying_key(public_key),
            Self::dalek_signature(signature),
        ) else {
            return false;
        };
        key.verify(message, &sig).is_ok()
    }
}

/// Ed25519 signing identity.
pub struct Ed25519Identity {
    signing_key: SigningKey,
}

impl Ed25519Identity {
    /// Generate a new random identity.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restore an identity from its 32-byte secret.
    pub fn from_secret(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Secret key bytes.
    pub fn secret(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl SignatureScheme for Ed25519Identity {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        Ed25519Verifier.verify(public_key, message, signature)
    }
}

impl SigningIdentity for Ed25519Identity {
    fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes().to_vec())
    }

    fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes().to_vec())
    }
}

impl fmt::Debug for Ed25519Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Identity")
            .field("public_key", &self.public_key())
            .finish()
    }
}
