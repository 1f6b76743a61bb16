//! Transaction module split into types and validation for better modularity

pub mod types;
pub mod validation;

pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Block;
    use crate::crypto::{AccountKey, KeyPair};
    use crate::error::ChainError;

    fn transfer(amount: u64) -> (KeyPair, Transaction) {
        let payer = KeyPair::generate();
        let payee = KeyPair::generate();
        let tx = Transaction::new(amount, payer.account_key(), payee.account_key());
        (payer, tx)
    }

    #[test]
    fn test_hash_covers_all_fields() {
        let (_, tx) = transfer(10);
        let hash = tx.hash().unwrap();
        assert_eq!(hash, tx.clone().hash().unwrap());

        let mut changed = tx.clone();
        changed.amount = 11;
        assert_ne!(hash, changed.hash().unwrap());

        let mut swapped = tx.clone();
        std::mem::swap(&mut swapped.payer, &mut swapped.payee);
        assert_ne!(hash, swapped.hash().unwrap());

        assert_eq!(tx.hash_str().unwrap().len(), 64);
    }

    #[test]
    fn test_signed_transaction_verifies() {
        let (payer, tx) = transfer(25);
        let signature = payer.sign_payload(&tx).unwrap();
        assert!(tx.verify_signature(&payer.account_key(), &signature).is_ok());
    }

    #[test]
    fn test_mutation_after_signing_invalidates() {
        let (payer, tx) = transfer(25);
        let signature = payer.sign_payload(&tx).unwrap();

        let mut tampered = tx.clone();
        tampered.amount = 2500;
        let result = tampered.verify_signature(&payer.account_key(), &signature);
        assert!(matches!(result, Err(ChainError::InvalidSignature(_))));

        let mut redirected = tx;
        redirected.payee = KeyPair::generate().account_key();
        assert!(redirected
            .verify_signature(&payer.account_key(), &signature)
            .is_err());
    }

    #[test]
    fn test_signer_must_be_payer() {
        let (_, tx) = transfer(5);
        let thief = KeyPair::generate();
        let signature = thief.sign_payload(&tx).unwrap();

        let result = tx.verify_signature(&thief.account_key(), &signature);
        assert!(result.unwrap_err().to_string().contains("is not the payer"));
    }

    #[test]
    fn test_validate_request_rules() {
        let (payer, tx) = transfer(1);
        assert!(tx.validate_request().is_ok());

        let zero = Transaction::new(0, tx.payer.clone(), tx.payee.clone());
        assert!(matches!(
            zero.validate_request(),
            Err(ChainError::InvalidTransaction(_))
        ));

        let self_send = Transaction::new(1, payer.account_key(), payer.account_key());
        assert!(self_send.validate_request().is_err());

        let mint = Transaction::genesis_mint(1000, payer.account_key());
        assert!(mint.is_genesis_mint());
        assert!(mint.validate_request().is_err());

        let to_genesis = Transaction::new(1, payer.account_key(), AccountKey::genesis());
        assert!(to_genesis.validate_request().is_err());
    }

    #[test]
    fn test_record_uses_fingerprints() {
        let authority = KeyPair::generate();
        let block = Block::genesis(1000, authority.account_key());
        let record = TransactionRecord::from_block(&block);

        assert_eq!(record.amount, 1000);
        assert_eq!(record.payee, authority.fingerprint().to_hex());
        assert_eq!(record.payer, AccountKey::genesis().fingerprint().to_hex());
        assert_eq!(record.timestamp, block.timestamp);
    }
}
