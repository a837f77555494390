//! ChaCha20-Poly1305 authenticated encryption under an agreed [`SharedSecret`].
//!
//! Output layout: `nonce (12 bytes) || ciphertext || auth tag (16 bytes)`.
//! A fresh random nonce is drawn for every call.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;

use crate::agreement::SharedSecret;
use crate::error::CryptoError;

pub const NONCE_SIZE: usize = 12; // 96-bit nonce for ChaCha20-Poly1305
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `shared_secret`.
pub fn encrypt(plaintext: &[u8], shared_secret: &SharedSecret) -> Result<Vec<u8>, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(&shared_secret.key)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut data = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    data.extend_from_slice(&nonce_bytes);
    data.extend_from_slice(&ciphertext);
    Ok(data)
}

/// Decrypt data produced by [`encrypt`].
///
/// Fails closed: every failure, whether a short blob, a wrong key or a
/// tampered tag, yields the same [`CryptoError::DecryptionFailed`] and no
/// plaintext.
pub fn decrypt(data: &[u8], shared_secret: &SharedSecret) -> Result<Vec<u8>, CryptoError> {
    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }
    let (nonce_bytes, ciphertext_with_tag) = data.split_at(NONCE_SIZE);

    let cipher = ChaCha20Poly1305::new_from_slice(&shared_secret.key)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext_with_tag)
        .map_err(|_| CryptoError::DecryptionFailed)
}
