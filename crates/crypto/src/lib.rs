//! sealpost-crypto: the cryptographic primitives behind sealpost envelopes.
//!
//! Provides X25519 key agreement expanded with HKDF-SHA256, ChaCha20-Poly1305
//! authenticated encryption, Ed25519 signatures and SHA-256 content hashes.
//! Everything here is a pure function of its arguments.

pub mod aead;
pub mod agreement;
pub mod error;
pub mod hash;
pub mod signing;

pub use aead::{decrypt, encrypt};
pub use agreement::{derive_shared_secret, EncryptionPublicKey, EncryptionSecretKey, SharedSecret};
pub use error::CryptoError;
pub use hash::{content_hash, ContentHash};
pub use signing::{sign, verify, SigningKey, VerifyingKey};
