//! Manager credential: the capability that authorizes ledger mutation.
//!
//! A credential is issued exactly once, when a [`LedgerStore`](crate::blockchain::LedgerStore)
//! is initialized. Components that guard privileged operations keep only a
//! [`CredentialSeal`] and check presented credentials against it.

use crate::crypto::AccountKey;
use crate::digest::Sha256Hash;
use crate::error::ChainError;
use sha2::{Digest, Sha256};
use std::fmt;

pub struct ManagerCredential {
    authority: AccountKey,
    secret: [u8; 32],
}

impl ManagerCredential {
    pub(crate) fn issue(authority: AccountKey) -> Self {
        ManagerCredential {
            authority,
            secret: rand::random(),
        }
    }

    /// Public key of the account the genesis supply was minted to.
    pub fn authority(&self) -> &AccountKey {
        &self.authority
    }

    pub(crate) fn seal(&self) -> CredentialSeal {
        let mut hasher = Sha256::new();
        hasher.update(self.authority.as_bytes());
        hasher.update(self.secret);
        CredentialSeal(hasher.finalize().into())
    }
}

impl fmt::Debug for ManagerCredential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ManagerCredential")
            .field("authority", &self.authority.fingerprint())
            .finish_non_exhaustive()
    }
}

/// One-way commitment to a credential, held by whatever it protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CredentialSeal(Sha256Hash);

impl CredentialSeal {
    pub(crate) fn check(&self, credential: &ManagerCredential) -> Result<(), ChainError> {
        if credential.seal() == *self {
            Ok(())
        } else {
            Err(ChainError::Unauthorized(
                "Invalid manager credential".to_string(),
            ))
        }
    }
}
