//! Error types for ProofLedger

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Authorization error: {0}")]
    Unauthorized(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    #[error("Insufficient funds: account {account} holds {balance}, requested {requested}")]
    InsufficientFunds {
        account: String,
        balance: u64,
        requested: u64,
    },

    #[error("Chain already initialized")]
    AlreadyInitialized,

    #[error("Chain is empty")]
    EmptyChain,

    #[error("Mining cancelled: {0}")]
    MiningCancelled(String),

    #[error("Mining failed: {0}")]
    MiningFailed(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Invalid status transition for {tx}: {from} -> {to}")]
    InvalidStatusTransition { tx: String, from: String, to: String },

    #[error("Username '{0}' already exists")]
    UsernameTaken(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Account {0} is already registered")]
    AccountExists(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for ChainError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
