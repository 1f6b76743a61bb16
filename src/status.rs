//! Transaction status lifecycle.
//!
//! ```text
//! Emitted ──> Processing ──> Committed
//!    │             │
//!    ├──> Invalid  └──> Error
//!    └──> Error
//! ```
//!
//! Committed, Invalid and Error are terminal.

use crate::credential::{CredentialSeal, ManagerCredential};
use crate::digest::{hash_to_hex, Sha256Hash};
use crate::error::ChainError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Emitted,
    Processing,
    Committed,
    Invalid,
    Error,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Committed | TransactionStatus::Invalid | TransactionStatus::Error
        )
    }

    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Emitted, Processing)
                | (Emitted, Invalid)
                | (Emitted, Error)
                | (Processing, Committed)
                | (Processing, Error)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            TransactionStatus::Emitted => "EMITTED",
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Committed => "COMMITTED",
            TransactionStatus::Invalid => "INVALID",
            TransactionStatus::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Observer notified by the ledger store as an append attempt progresses.
pub trait StatusListener: Send + Sync {
    fn on_status(&self, tx_hash: &Sha256Hash, status: TransactionStatus);
}

/// Listener that ignores every notification.
pub struct NoopListener;

impl StatusListener for NoopListener {
    fn on_status(&self, _tx_hash: &Sha256Hash, _status: TransactionStatus) {}
}

/// Status of every transaction accepted for intake, keyed by transaction hash.
///
/// Writes require the manager credential the book was created with.
pub struct StatusBook {
    seal: CredentialSeal,
    statuses: RwLock<HashMap<Sha256Hash, TransactionStatus>>,
}

impl StatusBook {
    pub fn new(credential: &ManagerCredential) -> Self {
        Self {
            seal: credential.seal(),
            statuses: RwLock::new(HashMap::new()),
        }
    }

    /// Record a transition for `tx_hash`.
    ///
    /// `Emitted` opens a lifecycle and is accepted when the hash is unknown or
    /// its previous lifecycle already ended (identical transfers share a hash).
    pub fn record(
        &self,
        credential: &ManagerCredential,
        tx_hash: Sha256Hash,
        status: TransactionStatus,
    ) -> Result<(), ChainError> {
        self.seal.check(credential)?;

        let mut statuses = self.statuses.write();
        let current = statuses.get(&tx_hash).copied();
        let allowed = match (current, status) {
            (None, TransactionStatus::Emitted) => true,
            (Some(prev), TransactionStatus::Emitted) => prev.is_terminal(),
            (Some(prev), next) => prev.can_transition_to(next),
            (None, _) => false,
        };

        if !allowed {
            return Err(ChainError::InvalidStatusTransition {
                tx: hash_to_hex(&tx_hash),
                from: current.map_or_else(|| "NONE".to_string(), |s| s.to_string()),
                to: status.to_string(),
            });
        }

        statuses.insert(tx_hash, status);
        Ok(())
    }

    pub fn get(&self, tx_hash: &Sha256Hash) -> Option<TransactionStatus> {
        self.statuses.read().get(tx_hash).copied()
    }

    pub fn len(&self) -> usize {
        self.statuses.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
