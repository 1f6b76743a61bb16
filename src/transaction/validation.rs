/// Validation logic for transactions separated from type definitions
use crate::crypto::{verify_payload, AccountKey};
use crate::error::ChainError;
use crate::transaction::types::Transaction;

impl Transaction {
    /// Stateless checks applied at intake, before any balance is consulted.
    pub fn validate_request(&self) -> Result<(), ChainError> {
        if self.amount == 0 {
            return Err(ChainError::InvalidTransaction(
                "Transfer amount must be greater than zero".to_string(),
            ));
        }
        if self.payer.is_genesis() {
            return Err(ChainError::InvalidTransaction(
                "The genesis sender cannot originate transfers".to_string(),
            ));
        }
        if self.payee.is_genesis() {
            return Err(ChainError::InvalidTransaction(
                "The genesis sender cannot receive transfers".to_string(),
            ));
        }
        if self.payer == self.payee {
            return Err(ChainError::InvalidTransaction(
                "Payer and payee cannot be the same".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks that `signature` was produced by `sender` over this exact
    /// transaction and that `sender` is the payer.
    pub fn verify_signature(&self, sender: &AccountKey, signature: &[u8]) -> Result<(), ChainError> {
        if *sender != self.payer {
            return Err(ChainError::InvalidSignature(format!(
                "Signer {} is not the payer {}",
                sender.fingerprint(),
                self.payer.fingerprint()
            )));
        }
        verify_payload(sender, self, signature)
    }
}
