//! Digest helpers: content hashing and short fingerprints.
//!
//! Two separate one-way hashes are used:
//! - SHA-256 over the canonical bincode encoding of an entity (content hash).
//!   Block linkage and transaction identity are built on this.
//! - A 128-bit truncation of BLAKE3 (fingerprint) for compact account keys and
//!   display labels. It is not relied on for security.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub type Sha256Hash = [u8; 32];

/// Length of an account fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 16;

/// Canonical encoding used for hashing and signing.
pub fn canonical_bytes<T: Serialize>(entity: &T) -> Result<Vec<u8>, ChainError> {
    bincode::serialize(entity)
        .map_err(|e| ChainError::SerializationError(format!("Canonical encoding failed: {}", e)))
}

/// SHA-256 of the canonical encoding of `entity`.
pub fn content_hash<T: Serialize>(entity: &T) -> Result<Sha256Hash, ChainError> {
    let bytes = canonical_bytes(entity)?;
    Ok(Sha256::digest(bytes).into())
}

/// Short, non-security fingerprint of arbitrary bytes.
pub fn short_fingerprint(value: &[u8]) -> Fingerprint {
    let hash = blake3::hash(value);
    let mut out = [0u8; FINGERPRINT_LEN];
    out.copy_from_slice(&hash.as_bytes()[..FINGERPRINT_LEN]);
    Fingerprint(out)
}

/// Convert a content hash to a hex string for display.
pub fn hash_to_hex(hash: &Sha256Hash) -> String {
    hex::encode(hash)
}

/// Number of leading zero nibbles (hex digits) in `bytes`.
pub fn leading_zero_nibbles(bytes: &[u8]) -> usize {
    let mut count = 0;
    for byte in bytes {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if byte >> 4 == 0 {
            count += 1;
        }
        break;
    }
    count
}

/// Compact account identifier derived from a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| ChainError::CryptoError(format!("Invalid hex fingerprint: {}", e)))?;
        let bytes: [u8; FINGERPRINT_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            ChainError::CryptoError(format!(
                "Fingerprint must be {} bytes, got {}",
                FINGERPRINT_LEN,
                b.len()
            ))
        })?;
        Ok(Fingerprint(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}
