//! Ed25519 identity signatures.
//!
//! Signatures are always produced and checked over exact byte strings; callers
//! are responsible for handing in the canonical serialized form.

use base64::Engine;
use ed25519_dalek::{Signature, Signer};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::agreement::decode_key_bytes;
use crate::error::CryptoError;

pub use ed25519_dalek::{SigningKey, VerifyingKey};

pub const SIGNATURE_SIZE: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Fresh random signing keypair.
pub fn ephemeral_signature_keys() -> (SigningKey, VerifyingKey) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key)
}

/// Keypair derived from a counter. Test fixtures only.
pub fn unsafe_deterministic_signature_keypair(n: u32) -> (SigningKey, VerifyingKey) {
    let mut hasher = Sha256::new();
    hasher.update(b"signature");
    hasher.update(n.to_le_bytes());
    let seed = Zeroizing::new(<[u8; 32]>::from(hasher.finalize()));
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key)
}

/// Sign `data`, returning the 64-byte signature.
pub fn sign(data: &[u8], signing_key: &SigningKey) -> [u8; SIGNATURE_SIZE] {
    signing_key.sign(data).to_bytes()
}

/// Check `signature` over `data`.
///
/// Malformed signatures verify as `false` rather than erroring. Uses strict
/// verification, so small-order keys and non-canonical `R`/`s` are refused.
pub fn verify(data: &[u8], signature: &[u8], public_key: &VerifyingKey) -> bool {
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    public_key.verify_strict(data, &signature).is_ok()
}

pub fn signature_to_string(signature: &[u8; SIGNATURE_SIZE]) -> String {
    base64::engine::general_purpose::STANDARD.encode(signature)
}

pub fn string_to_signature(encoded: &str) -> Result<[u8; SIGNATURE_SIZE], CryptoError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::InvalidKeyMaterial(format!("signature: {e}")))?;
    <[u8; SIGNATURE_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
        CryptoError::InvalidKeyMaterial(format!(
            "signature: expected {SIGNATURE_SIZE} bytes, got {}",
            bytes.len()
        ))
    })
}

pub fn signature_secret_key_to_string(signing_key: &SigningKey) -> String {
    let bytes = Zeroizing::new(signing_key.to_bytes());
    base64::engine::general_purpose::STANDARD.encode(&bytes[..])
}

pub fn signature_public_key_to_string(verifying_key: &VerifyingKey) -> String {
    base64::engine::general_purpose::STANDARD.encode(verifying_key.as_bytes())
}

pub fn string_to_signature_secret_key(encoded: &str) -> Result<SigningKey, CryptoError> {
    let bytes = decode_key_bytes(encoded, "signature secret key")?;
    Ok(SigningKey::from_bytes(&bytes))
}

pub fn string_to_signature_public_key(encoded: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = decode_key_bytes(encoded, "signature public key")?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| CryptoError::InvalidKeyMaterial(format!("signature public key: {e}")))
}
