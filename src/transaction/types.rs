/// Transaction types for ProofLedger
use crate::blockchain::Block;
use crate::crypto::AccountKey;
use crate::digest::{content_hash, hash_to_hex, Sha256Hash};
use crate::error::ChainError;
use serde::{Deserialize, Serialize};

/// A transfer of `amount` coins from `payer` to `payee`.
///
/// The canonical encoding covers exactly these three fields; it is what gets
/// signed and what the transaction hash is computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: u64,
    pub payer: AccountKey,
    pub payee: AccountKey,
}

impl Transaction {
    pub fn new(amount: u64, payer: AccountKey, payee: AccountKey) -> Self {
        Self {
            amount,
            payer,
            payee,
        }
    }

    /// The initial coin offering recorded in the genesis block.
    pub fn genesis_mint(initial_supply: u64, authority: AccountKey) -> Self {
        Self::new(initial_supply, AccountKey::genesis(), authority)
    }

    pub fn is_genesis_mint(&self) -> bool {
        self.payer.is_genesis()
    }

    /// Content hash of the transaction.
    pub fn hash(&self) -> Result<Sha256Hash, ChainError> {
        content_hash(self)
    }

    pub fn hash_str(&self) -> Result<String, ChainError> {
        Ok(hash_to_hex(&self.hash()?))
    }
}

/// Display projection of a committed transfer.
///
/// Keys are replaced by fingerprints so listings stay readable; the account
/// registry can further rewrite them to usernames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: u64,
    pub payer: String,
    pub payee: String,
    pub timestamp: u64,
}

impl TransactionRecord {
    pub fn from_block(block: &Block) -> Self {
        Self {
            amount: block.transaction.amount,
            payer: block.transaction.payer.fingerprint().to_hex(),
            payee: block.transaction.payee.fingerprint().to_hex(),
            timestamp: block.timestamp,
        }
    }
}
