//! X25519 key agreement.
//!
//! Encryption keys are Curve25519 static secrets. The raw Diffie-Hellman
//! output is never used directly: it is expanded with HKDF-SHA256 into the
//! symmetric key consumed by [`crate::aead`].

use base64::Engine;
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

pub use x25519_dalek::{PublicKey as EncryptionPublicKey, StaticSecret as EncryptionSecretKey};

const SHARED_KEY_INFO: &[u8] = b"sealpost-envelope-v1";
const KEY_SIZE: usize = 32;

/// Symmetric key agreed between two parties, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    pub(crate) key: [u8; KEY_SIZE],
}

impl SharedSecret {
    /// Wrap raw key bytes. Intended for tests and key-import paths.
    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Derive the shared symmetric key for `my_secret_key` and
/// `their_public_key`. Both sides of a conversation derive the same key.
///
/// Rejects low-order public keys, which would force an all-zero secret.
pub fn derive_shared_secret(
    my_secret_key: &EncryptionSecretKey,
    their_public_key: &EncryptionPublicKey,
) -> Result<SharedSecret, CryptoError> {
    let dh = my_secret_key.diffie_hellman(their_public_key);
    if !dh.was_contributory() {
        tracing::warn!("rejected non-contributory x25519 public key");
        return Err(CryptoError::InvalidKeyMaterial(
            "public key is a low-order point".into(),
        ));
    }

    let hk = Hkdf::<Sha256>::new(None, dh.as_bytes());
    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    hk.expand(SHARED_KEY_INFO, &mut okm[..])
        .map_err(|e| CryptoError::InvalidKeyMaterial(e.to_string()))?;

    Ok(SharedSecret { key: *okm })
}

/// Fresh random encryption keypair.
pub fn ephemeral_encryption_keys() -> (EncryptionSecretKey, EncryptionPublicKey) {
    let secret = EncryptionSecretKey::random_from_rng(OsRng);
    let public = EncryptionPublicKey::from(&secret);
    (secret, public)
}

/// Keypair derived from a counter. Reproducible and therefore only fit for
/// tests and fixtures.
pub fn unsafe_deterministic_encryption_keypair(n: u32) -> (EncryptionSecretKey, EncryptionPublicKey) {
    let seed: [u8; KEY_SIZE] = Sha256::digest(n.to_le_bytes()).into();
    let secret = EncryptionSecretKey::from(seed);
    let public = EncryptionPublicKey::from(&secret);
    (secret, public)
}

pub fn encryption_secret_key_to_string(secret_key: &EncryptionSecretKey) -> String {
    let bytes = Zeroizing::new(secret_key.to_bytes());
    base64::engine::general_purpose::STANDARD.encode(&bytes[..])
}

pub fn encryption_public_key_to_string(public_key: &EncryptionPublicKey) -> String {
    base64::engine::general_purpose::STANDARD.encode(public_key.as_bytes())
}

pub fn string_to_encryption_secret_key(encoded: &str) -> Result<EncryptionSecretKey, CryptoError> {
    let bytes = decode_key_bytes(encoded, "encryption secret key")?;
    Ok(EncryptionSecretKey::from(*bytes))
}

pub fn string_to_encryption_public_key(encoded: &str) -> Result<EncryptionPublicKey, CryptoError> {
    let bytes = decode_key_bytes(encoded, "encryption public key")?;
    Ok(EncryptionPublicKey::from(*bytes))
}

/// Decode a base64 key string into exactly 32 bytes.
pub(crate) fn decode_key_bytes(
    encoded: &str,
    what: &str,
) -> Result<Zeroizing<[u8; KEY_SIZE]>, CryptoError> {
    let decoded = Zeroizing::new(
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("{what}: {e}")))?,
    );
    if decoded.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyMaterial(format!(
            "{what}: expected {KEY_SIZE} bytes, got {}",
            decoded.len()
        )));
    }
    let mut out = Zeroizing::new([0u8; KEY_SIZE]);
    out.copy_from_slice(&decoded);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sides_derive_the_same_secret() {
        let (alice_sk, alice_pk) = ephemeral_encryption_keys();
        let (bob_sk, bob_pk) = ephemeral_encryption_keys();
        let a = derive_shared_secret(&alice_sk, &bob_pk).unwrap();
        let b = derive_shared_secret(&bob_sk, &alice_pk).unwrap();
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn derivation_is_deterministic() {
        let (alice_sk, _) = unsafe_deterministic_encryption_keypair(0);
        let (_, bob_pk) = unsafe_deterministic_encryption_keypair(1);
        let a = derive_shared_secret(&alice_sk, &bob_pk).unwrap();
        let b = derive_shared_secret(&alice_sk, &bob_pk).unwrap();
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn different_peers_give_different_secrets() {
        let (alice_sk, _) = unsafe_deterministic_encryption_keypair(0);
        let (_, bob_pk) = unsafe_deterministic_encryption_keypair(1);
        let (_, carol_pk) = unsafe_deterministic_encryption_keypair(2);
        let ab = derive_shared_secret(&alice_sk, &bob_pk).unwrap();
        let ac = derive_shared_secret(&alice_sk, &carol_pk).unwrap();
        assert_ne!(ab.key, ac.key);
    }

    #[test]
    fn low_order_public_key_is_rejected() {
        let (alice_sk, _) = ephemeral_encryption_keys();
        let zero = EncryptionPublicKey::from([0u8; 32]);
        let result = derive_shared_secret(&alice_sk, &zero);
        assert!(matches!(result, Err(CryptoError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn deterministic_keypairs_are_reproducible() {
        let (sk1, pk1) = unsafe_deterministic_encryption_keypair(7);
        let (sk2, pk2) = unsafe_deterministic_encryption_keypair(7);
        assert_eq!(sk1.to_bytes(), sk2.to_bytes());
        assert_eq!(pk1, pk2);
        let (_, other) = unsafe_deterministic_encryption_keypair(8);
        assert_ne!(pk1, other);
    }

    #[test]
    fn key_strings_round_trip() {
        let (sk, pk) = ephemeral_encryption_keys();
        let sk_back = string_to_encryption_secret_key(&encryption_secret_key_to_string(&sk)).unwrap();
        let pk_back = string_to_encryption_public_key(&encryption_public_key_to_string(&pk)).unwrap();
        assert_eq!(sk_back.to_bytes(), sk.to_bytes());
        assert_eq!(pk_back, pk);
    }

    #[test]
    fn malformed_key_strings_are_invalid_key_material() {
        assert!(matches!(
            string_to_encryption_public_key("not base64!"),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
        let short = base64::engine::general_purpose::STANDARD.encode([1u8; 31]);
        assert!(matches!(
            string_to_encryption_secret_key(&short),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn shared_secret_debug_hides_key() {
        let secret = SharedSecret::from_bytes([0x42; 32]);
        assert_eq!(format!("{secret:?}"), "SharedSecret(..)");
    }
}
