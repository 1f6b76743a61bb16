//! Cryptographic primitives for ProofLedger

use crate::digest::{canonical_bytes, short_fingerprint, Fingerprint};
use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Compact ECDSA signature bytes.
pub type SignatureBytes = [u8; COMPACT_SIGNATURE_SIZE];

/// Externally visible account identifier: the compressed public key bytes.
///
/// The reserved genesis sender is the only key that is not a curve point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey(#[serde(with = "serde_bytes")] Vec<u8>);

impl AccountKey {
    const GENESIS_SENDER: &'static [u8] = b"genesis";

    /// The sender of the genesis mint.
    pub fn genesis() -> Self {
        AccountKey(Self::GENESIS_SENDER.to_vec())
    }

    pub fn is_genesis(&self) -> bool {
        self.0 == Self::GENESIS_SENDER
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        AccountKey(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Short lookup key used by the balance cache and for display.
    pub fn fingerprint(&self) -> Fingerprint {
        short_fingerprint(&self.0)
    }
}

impl From<&PublicKey> for AccountKey {
    fn from(key: &PublicKey) -> Self {
        AccountKey(key.serialize().to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    /// Creates a KeyPair from an existing SecretKey.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        Ok(Self::from_secret_key(secret_key))
    }

    /// Returns the KeyPair's public key as a compressed byte array.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.serialize()
    }

    pub fn account_key(&self) -> AccountKey {
        AccountKey::from(&self.public_key)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.account_key().fingerprint()
    }

    /// Signs a message (which is first hashed using SHA-256) and returns the compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<SignatureBytes, ChainError> {
        let digest = Sha256::digest(message);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))?;

        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }

    /// Signs the canonical encoding of `payload`.
    pub fn sign_payload<T: Serialize>(&self, payload: &T) -> Result<SignatureBytes, ChainError> {
        self.sign(&canonical_bytes(payload)?)
    }
}

/// Verifies an ECDSA signature given the raw public key bytes, message, and signature bytes.
pub fn verify_signature(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), ChainError> {
    if public_key_bytes.len() != PUBLIC_KEY_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Public key must be exactly {} bytes (compressed), got {}",
            PUBLIC_KEY_SIZE,
            public_key_bytes.len()
        )));
    }
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = PublicKey::from_slice(public_key_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid public key: {}", e)))?;

    let digest = Sha256::digest(message);
    let message = Message::from_digest_slice(&digest)
        .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))?;

    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid signature: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| ChainError::InvalidSignature("Signature verification failed".to_string()))
}

/// Verifies `signature` over the canonical encoding of `payload`.
pub fn verify_payload<T: Serialize>(
    signer: &AccountKey,
    payload: &T,
    signature: &[u8],
) -> Result<(), ChainError> {
    verify_signature(signer.as_bytes(), &canonical_bytes(payload)?, signature)
}

/// Boolean form of [`verify_payload`]: any failure counts as an invalid signature.
pub fn is_valid_signature<T: Serialize>(signer: &AccountKey, payload: &T, signature: &[u8]) -> bool {
    verify_payload(signer, payload, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.public_key_bytes().len(), PUBLIC_KEY_SIZE);
        assert_eq!(keypair.secret_key.as_ref().len(), SECRET_KEY_SIZE);
    }

    #[test]
    fn test_fresh_keys_do_not_collide() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.account_key(), b.account_key());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_signing_and_verification() {
        let keypair = KeyPair::generate();
        let message = b"Hello, ProofLedger!";

        let signature = keypair.sign(message).unwrap();
        let pubkey_bytes = keypair.public_key_bytes();

        assert!(verify_signature(&pubkey_bytes, message, &signature).is_ok());
        assert_eq!(signature.len(), COMPACT_SIGNATURE_SIZE);
    }

    #[test]
    fn test_invalid_signature() {
        let keypair1 = KeyPair::generate();
        let keypair2 = KeyPair::generate();

        let message = b"Test message";
        let signature = keypair1.sign(message).unwrap();

        let result = verify_signature(&keypair2.public_key_bytes(), message, &signature);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid signature: Signature verification failed"
        );
    }

    #[test]
    fn test_tampered_payload() {
        #[derive(Serialize)]
        struct Payload {
            amount: u64,
        }

        let keypair = KeyPair::generate();
        let signature = keypair.sign_payload(&Payload { amount: 10 }).unwrap();

        let signer = keypair.account_key();
        assert!(is_valid_signature(&signer, &Payload { amount: 10 }, &signature));
        assert!(!is_valid_signature(&signer, &Payload { amount: 11 }, &signature));
    }

    #[test]
    fn test_invalid_key_or_sig_length_check() {
        let keypair = KeyPair::generate();
        let message = b"Test";
        let signature = keypair.sign(message).unwrap();
        let pubkey_bytes = keypair.public_key_bytes();

        let result = verify_signature(&pubkey_bytes[1..], message, &signature);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Public key must be exactly"));

        let result = verify_signature(&pubkey_bytes, message, &signature[1..]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Signature must be exactly"));
    }

    #[test]
    fn test_genesis_key_never_verifies() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign(b"mint").unwrap();
        assert!(AccountKey::genesis().is_genesis());
        assert!(!is_valid_signature(&AccountKey::genesis(), &"mint", &signature));
    }

    #[test]
    fn test_from_secret_bytes_roundtrip_and_invalid_length() {
        let keypair = KeyPair::generate();
        let restored = KeyPair::from_secret_bytes(&keypair.secret_key.secret_bytes()).unwrap();
        assert_eq!(restored.account_key(), keypair.account_key());

        let short_bytes = [0u8; SECRET_KEY_SIZE - 1];
        let result = KeyPair::from_secret_bytes(&short_bytes);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Secret key must be"));
    }
}
