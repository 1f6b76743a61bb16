//! Account handle: a keypair bound to the authority that settles its transfers.

use crate::authority::IssuingAuthority;
use crate::crypto::{AccountKey, KeyPair};
use crate::digest::{Fingerprint, Sha256Hash};
use crate::error::ChainError;
use crate::transaction::{Transaction, TransactionRecord};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Wallets never touch the ledger directly; they only sign requests.
pub struct Wallet {
    keypair: KeyPair,
    authority: Arc<IssuingAuthority>,
}

impl Wallet {
    pub(crate) fn new(keypair: KeyPair, authority: Arc<IssuingAuthority>) -> Self {
        Wallet { keypair, authority }
    }

    pub fn public_key(&self) -> AccountKey {
        self.keypair.account_key()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.keypair.fingerprint()
    }

    #[cfg(test)]
    pub(crate) fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn authority(&self) -> &Arc<IssuingAuthority> {
        &self.authority
    }

    pub fn balance(&self) -> u64 {
        self.authority.balance_of(&self.fingerprint())
    }

    /// Sign a transfer of `amount` to `payee` and submit it.
    pub async fn send_money(&self, amount: u64, payee: &AccountKey) -> Result<Sha256Hash, ChainError> {
        let transaction = Transaction::new(amount, self.public_key(), payee.clone());
        let signature = self.keypair.sign_payload(&transaction)?;
        debug!("{} sending {} to {}", self.fingerprint(), amount, payee.fingerprint());
        self.authority
            .add_transaction(transaction, &self.public_key(), &signature)
            .await
    }

    /// Transfers this wallet paid or received.
    pub fn transactions(&self) -> Result<Vec<TransactionRecord>, ChainError> {
        self.authority.wallet_transactions(&self.public_key())
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::LedgerStore;
    use crate::miner::Miner;
    use crate::status::TransactionStatus;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_money_between_wallets() {
        tokio::time::timeout(Duration::from_secs(60), async {
            let (authority, _master) =
                IssuingAuthority::new(LedgerStore::new(Miner::default()), 1000).unwrap();
            let alice = authority.create_wallet(100).await.unwrap();
            let bob = authority.create_wallet(0).await.unwrap();

            let tx_hash = alice.send_money(30, &bob.public_key()).await.unwrap();

            assert_eq!(
                authority.transaction_status(&tx_hash),
                Some(TransactionStatus::Committed)
            );
            assert_eq!(alice.balance(), 70);
            assert_eq!(bob.balance(), 30);
            assert_eq!(alice.transactions().unwrap().len(), 2);
            assert_eq!(bob.transactions().unwrap().len(), 1);
        })
        .await
        .expect("test_send_money_between_wallets timed out");
    }

    #[tokio::test]
    async fn test_empty_wallet_cannot_send() {
        let (authority, master) =
            IssuingAuthority::new(LedgerStore::new(Miner::default()), 1000).unwrap();
        let empty = authority.create_wallet(0).await.unwrap();

        let result = empty.send_money(1, &master.public_key()).await;
        assert!(matches!(result, Err(ChainError::InsufficientFunds { .. })));
        assert_eq!(empty.balance(), 0);
    }

    #[test]
    fn test_debug_hides_keys() {
        let (_, master) = IssuingAuthority::new(LedgerStore::new(Miner::default()), 10).unwrap();
        let rendered = format!("{:?}", master);
        assert!(rendered.contains(&master.fingerprint().to_hex()));
        assert!(!rendered.contains("secret"));
    }
}
