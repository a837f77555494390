//! Error types for the sealpost-crypto crate.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The provided key material is invalid (wrong length, bad encoding,
    /// low-order point, etc.).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Encryption could not be performed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed. Deliberately carries no detail: a wrong key, a
    /// tampered tag and a truncated blob are indistinguishable.
    #[error("decryption failed")]
    DecryptionFailed,
}

impl From<CryptoError> for sealpost_shared::error::ProtocolError {
    fn from(err: CryptoError) -> Self {
        sealpost_shared::error::ProtocolError::Crypto(err.to_string())
    }
}
