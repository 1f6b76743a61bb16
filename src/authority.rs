//! Issuing authority: the only component allowed to mutate the ledger.
//!
//! The authority owns the manager credential, the status book and the
//! balance cache. Every transfer goes through [`IssuingAuthority::add_transaction`]:
//!
//! 1. stateless request checks
//! 2. payer lock + solvency check against the balance cache
//! 3. status `Emitted`
//! 4. signature check, proof-of-work and commit in the ledger store
//! 5. settlement of the balance cache when the block commits

use crate::blockchain::{Block, LedgerStore};
use crate::cache::BalanceCache;
use crate::config::Config;
use crate::credential::ManagerCredential;
use crate::crypto::{AccountKey, KeyPair};
use crate::digest::{hash_to_hex, Fingerprint, Sha256Hash};
use crate::error::ChainError;
use crate::miner::Miner;
use crate::status::{StatusBook, StatusListener, TransactionStatus};
use crate::transaction::{Transaction, TransactionRecord};
use crate::wallet::Wallet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct IssuingAuthority {
    credential: ManagerCredential,
    store: LedgerStore,
    balances: BalanceCache,
    statuses: StatusBook,
    master: KeyPair,
}

impl IssuingAuthority {
    /// Initialize `store` with `initial_supply` minted to a fresh master key.
    ///
    /// Returns the authority together with the master wallet.
    pub fn new(store: LedgerStore, initial_supply: u64) -> Result<(Arc<Self>, Wallet), ChainError> {
        if initial_supply == 0 {
            return Err(ChainError::InvalidTransaction(
                "Initial supply must be greater than zero".to_string(),
            ));
        }

        let master = KeyPair::generate();
        let credential = store.initialize(initial_supply, master.account_key())?;
        let balances = BalanceCache::new();
        balances.register(master.fingerprint(), initial_supply);
        let statuses = StatusBook::new(&credential);

        info!(
            "Issuing authority {} holds the initial supply of {}",
            master.fingerprint(),
            initial_supply
        );

        let authority = Arc::new(IssuingAuthority {
            credential,
            store,
            balances,
            statuses,
            master: master.clone(),
        });
        let wallet = Wallet::new(master, Arc::clone(&authority));
        Ok((authority, wallet))
    }

    /// Build the store and authority described by `config`.
    pub fn bootstrap(config: &Config) -> Result<(Arc<Self>, Wallet), ChainError> {
        config.validate()?;
        let store = LedgerStore::new(Miner::from_config(&config.miner));
        Self::new(store, config.ledger.initial_supply)
    }

    /// Submit a signed transfer.
    ///
    /// Requests that fail the stateless checks or the solvency check are
    /// rejected before any status is recorded. Otherwise the hash is returned
    /// once the attempt reached a terminal status; query it with
    /// [`transaction_status`](Self::transaction_status).
    pub async fn add_transaction(
        &self,
        transaction: Transaction,
        sender: &AccountKey,
        signature: &[u8],
    ) -> Result<Sha256Hash, ChainError> {
        transaction.validate_request()?;
        let tx_hash = transaction.hash()?;
        let payer = transaction.payer.fingerprint();

        let _payer_guard = self.balances.lock_account(payer).await;
        if !self.balances.can_afford(&payer, transaction.amount) {
            let balance = self.balances.get(&payer);
            debug!(
                "Rejecting {}: {} cannot afford {} (balance {})",
                hash_to_hex(&tx_hash),
                payer,
                transaction.amount,
                balance
            );
            return Err(ChainError::InsufficientFunds {
                account: payer.to_hex(),
                balance,
                requested: transaction.amount,
            });
        }

        self.statuses
            .record(&self.credential, tx_hash, TransactionStatus::Emitted)?;

        let listener = SettlementListener {
            authority: self,
            transaction: transaction.clone(),
        };
        match self
            .store
            .append_block(&self.credential, transaction, sender, signature, &listener)
            .await
        {
            Ok(status) => {
                info!("Transaction {} finished as {}", hash_to_hex(&tx_hash), status);
                Ok(tx_hash)
            }
            Err(e) => {
                if let Err(record_err) =
                    self.statuses
                        .record(&self.credential, tx_hash, TransactionStatus::Error)
                {
                    warn!("Could not mark {} as failed: {}", hash_to_hex(&tx_hash), record_err);
                }
                Err(e)
            }
        }
    }

    /// Create a wallet with a fresh keypair, funded with `deposit` from the
    /// master wallet.
    pub async fn create_wallet(self: &Arc<Self>, deposit: u64) -> Result<Wallet, ChainError> {
        let wallet = Wallet::new(KeyPair::generate(), Arc::clone(self));
        self.balances.register(wallet.fingerprint(), 0);
        info!("Created wallet {}", wallet.fingerprint());

        if deposit > 0 {
            let master = Wallet::new(self.master.clone(), Arc::clone(self));
            let tx_hash = master.send_money(deposit, &wallet.public_key()).await?;
            match self.transaction_status(&tx_hash) {
                Some(TransactionStatus::Committed) => {}
                status => {
                    return Err(ChainError::InvalidTransaction(format!(
                        "Deposit {} for wallet {} ended as {}",
                        hash_to_hex(&tx_hash),
                        wallet.fingerprint(),
                        status.map_or_else(|| "NONE".to_string(), |s| s.to_string())
                    )))
                }
            }
        }
        Ok(wallet)
    }

    pub fn transaction_status(&self, tx_hash: &Sha256Hash) -> Option<TransactionStatus> {
        self.statuses.get(tx_hash)
    }

    pub fn balance_of(&self, account: &Fingerprint) -> u64 {
        self.balances.get(account)
    }

    pub fn total_supply(&self) -> u64 {
        self.balances.total_supply()
    }

    /// All cached balances, sorted by fingerprint.
    pub fn balances(&self) -> Vec<(Fingerprint, u64)> {
        self.balances.accounts()
    }

    pub fn chain_len(&self) -> usize {
        self.store.len()
    }

    pub fn head(&self) -> Result<Block, ChainError> {
        self.store.current_head()
    }

    pub fn master_key(&self) -> AccountKey {
        self.master.account_key()
    }

    /// Every block's transaction, genesis mint included, oldest first.
    pub fn all_transactions(&self) -> Result<Vec<TransactionRecord>, ChainError> {
        self.transactions_matching(|_| true)
    }

    pub fn transactions_matching<F>(&self, predicate: F) -> Result<Vec<TransactionRecord>, ChainError>
    where
        F: Fn(&Transaction) -> bool,
    {
        let blocks = self
            .store
            .search(&self.credential, |block| predicate(&block.transaction))?;
        Ok(blocks.iter().map(TransactionRecord::from_block).collect())
    }

    pub fn transactions_received(&self, key: &AccountKey) -> Result<Vec<TransactionRecord>, ChainError> {
        self.transactions_matching(|tx| tx.payee == *key)
    }

    pub fn transactions_paid(&self, key: &AccountKey) -> Result<Vec<TransactionRecord>, ChainError> {
        self.transactions_matching(|tx| tx.payer == *key)
    }

    /// Transfers where `key` is payer or payee.
    pub fn wallet_transactions(&self, key: &AccountKey) -> Result<Vec<TransactionRecord>, ChainError> {
        self.transactions_matching(|tx| tx.payer == *key || tx.payee == *key)
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        self.store.validate(&self.credential)
    }

    /// Cancel mining in flight; later transfers end with status `Error`.
    pub fn shutdown(&self) {
        self.store.shutdown();
    }

    fn settle(&self, transaction: &Transaction) -> Result<(), ChainError> {
        let payee = transaction.payee.fingerprint();
        let payer = transaction.payer.fingerprint();
        self.balances.credit(payee, transaction.amount)?;
        self.balances.debit(payer, transaction.amount)?;
        debug!("Settled {} from {} to {}", transaction.amount, payer, payee);
        Ok(())
    }
}

impl std::fmt::Debug for IssuingAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("IssuingAuthority")
            .field("master", &self.master.fingerprint())
            .field("blocks", &self.store.len())
            .field("accounts", &self.balances.len())
            .finish()
    }
}

/// Records each transition reported by the store and settles balances on commit.
struct SettlementListener<'a> {
    authority: &'a IssuingAuthority,
    transaction: Transaction,
}

impl StatusListener for SettlementListener<'_> {
    fn on_status(&self, tx_hash: &Sha256Hash, status: TransactionStatus) {
        let authority = self.authority;
        if let Err(e) = authority
            .statuses
            .record(&authority.credential, *tx_hash, status)
        {
            warn!("Status update for {} rejected: {}", hash_to_hex(tx_hash), e);
        }

        if status == TransactionStatus::Committed {
            if let Err(e) = authority.settle(&self.transaction) {
                error!("Settlement of {} failed: {}", hash_to_hex(tx_hash), e);
            }
        }
    }
}
