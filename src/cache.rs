//! Balance cache for account fingerprints
//!
//! Balances are a derived view of the chain, kept so solvency checks never
//! have to walk every block:
//! - Seeded when an account is registered
//! - Mutated only by settlement after a transfer commits
//! - Read freely by solvency checks and queries
//!
//! Mutators are crate-visible; the issuing authority is their only caller.
use crate::digest::Fingerprint;
use crate::error::ChainError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Guard serializing intake and settlement for one payer.
pub type AccountGuard = OwnedMutexGuard<()>;

/// Thread-safe fingerprint → balance map. Clones share the same state.
#[derive(Clone, Default)]
pub struct BalanceCache {
    balances: Arc<RwLock<HashMap<Fingerprint, u64>>>,
    account_locks: Arc<Mutex<HashMap<Fingerprint, Arc<AsyncMutex<()>>>>>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or reset) the balance entry for `account`.
    pub(crate) fn register(&self, account: Fingerprint, initial_balance: u64) {
        debug!("Registering {} with balance {}", account, initial_balance);
        self.balances.write().insert(account, initial_balance);
    }

    /// Current balance; unknown accounts hold zero.
    pub fn get(&self, account: &Fingerprint) -> u64 {
        self.balances.read().get(account).copied().unwrap_or(0)
    }

    pub fn contains(&self, account: &Fingerprint) -> bool {
        self.balances.read().contains_key(account)
    }

    pub(crate) fn credit(&self, account: Fingerprint, amount: u64) -> Result<u64, ChainError> {
        let mut balances = self.balances.write();
        let balance = balances.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or_else(|| {
            ChainError::InvalidTransaction(format!("Balance overflow crediting {}", account))
        })?;
        debug!("Credited {} to {} (now {})", amount, account, *balance);
        Ok(*balance)
    }

    pub(crate) fn debit(&self, account: Fingerprint, amount: u64) -> Result<u64, ChainError> {
        let mut balances = self.balances.write();
        let balance = balances.entry(account).or_insert(0);
        let remaining = balance
            .checked_sub(amount)
            .ok_or_else(|| ChainError::InsufficientFunds {
                account: account.to_hex(),
                balance: *balance,
                requested: amount,
            })?;
        *balance = remaining;
        debug!("Debited {} from {} (now {})", amount, account, remaining);
        Ok(remaining)
    }

    /// True iff the balance left after paying `amount` is strictly positive.
    ///
    /// Spending an account down to exactly zero is refused.
    pub fn can_afford(&self, account: &Fingerprint, amount: u64) -> bool {
        self.get(account) > amount
    }

    /// Sum of every balance.
    pub fn total_supply(&self) -> u64 {
        self.balances.read().values().sum()
    }

    /// Snapshot of all balances, sorted by fingerprint.
    pub fn accounts(&self) -> Vec<(Fingerprint, u64)> {
        let mut accounts: Vec<_> = self
            .balances
            .read()
            .iter()
            .map(|(fp, balance)| (*fp, *balance))
            .collect();
        accounts.sort();
        accounts
    }

    pub fn len(&self) -> usize {
        self.balances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for exclusive use of `account` as a payer.
    pub async fn lock_account(&self, account: Fingerprint) -> AccountGuard {
        let lock = {
            let mut locks = self.account_locks.lock();
            Arc::clone(locks.entry(account).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::short_fingerprint;
    use std::time::Duration;

    fn account(name: &str) -> Fingerprint {
        short_fingerprint(name.as_bytes())
    }

    #[test]
    fn test_unknown_account_is_zero() {
        let cache = BalanceCache::new();
        assert_eq!(cache.get(&account("nobody")), 0);
        assert!(!cache.contains(&account("nobody")));
    }

    #[test]
    fn test_credit_and_debit() {
        let cache = BalanceCache::new();
        let alice = account("alice");
        cache.register(alice, 100);

        assert_eq!(cache.credit(alice, 50).unwrap(), 150);
        assert_eq!(cache.debit(alice, 30).unwrap(), 120);
        assert_eq!(cache.get(&alice), 120);
    }

    #[test]
    fn test_debit_never_goes_negative() {
        let cache = BalanceCache::new();
        let bob = account("bob");
        cache.register(bob, 10);

        let result = cache.debit(bob, 11);
        assert!(matches!(
            result,
            Err(ChainError::InsufficientFunds {
                balance: 10,
                requested: 11,
                ..
            })
        ));
        assert_eq!(cache.get(&bob), 10);
    }

    #[test]
    fn test_can_afford_is_strict() {
        let cache = BalanceCache::new();
        let carol = account("carol");
        cache.register(carol, 65);

        assert!(cache.can_afford(&carol, 64));
        assert!(!cache.can_afford(&carol, 65));
        assert!(!cache.can_afford(&carol, 100));
        assert!(!cache.can_afford(&account("unknown"), 1));
    }

    #[test]
    fn test_transfer_conserves_supply() {
        let cache = BalanceCache::new();
        let (a, b) = (account("a"), account("b"));
        cache.register(a, 1000);
        cache.register(b, 0);

        cache.credit(b, 100).unwrap();
        cache.debit(a, 100).unwrap();

        assert_eq!(cache.total_supply(), 1000);
        assert_eq!(cache.accounts().len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let cache = BalanceCache::new();
        let shared = cache.clone();
        cache.register(account("dave"), 7);
        assert_eq!(shared.get(&account("dave")), 7);
    }

    #[tokio::test]
    async fn test_account_lock_serializes_payers() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let cache = BalanceCache::new();
            let erin = account("erin");
            let frank = account("frank");

            let guard = cache.lock_account(erin).await;
            // A different account is not blocked.
            let _other = cache.lock_account(frank).await;

            let waiting = tokio::time::timeout(Duration::from_millis(50), cache.lock_account(erin)).await;
            assert!(waiting.is_err());

            drop(guard);
            let _again = cache.lock_account(erin).await;
        })
        .await
        .expect("test_account_lock_serializes_payers timed out");
    }
}
