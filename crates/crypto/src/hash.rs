use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::CryptoError;

pub const HASH_SIZE: usize = 32;

/// SHA-256 digest of a canonical byte string. Displays as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; HASH_SIZE]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let mut out = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("content hash: {e}")))?;
        Ok(Self(out))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

pub fn content_hash(canonical_bytes: &[u8]) -> ContentHash {
    ContentHash(Sha256::digest(canonical_bytes).into())
}
