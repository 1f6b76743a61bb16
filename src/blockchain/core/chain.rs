use crate::credential::{CredentialSeal, ManagerCredential};
use crate::crypto::AccountKey;
use crate::digest::{content_hash, hash_to_hex, Sha256Hash};
use crate::error::ChainError;
use crate::miner::Miner;
use crate::status::{StatusListener, TransactionStatus};
use crate::transaction::Transaction;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::validation::validate_chain;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: Sha256Hash = [0u8; 32];

/// Upper bound (inclusive) of the random proof-of-work seed.
pub const MAX_NONCE: u64 = 999_999_999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub previous_hash: Sha256Hash,
    pub transaction: Transaction,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Random seed the proof-of-work search starts from.
    pub nonce: u64,
    /// Solution found for `nonce`; zero for the genesis block.
    pub proof: u64,
}

impl Block {
    pub fn new(previous_hash: Sha256Hash, transaction: Transaction) -> Self {
        Block {
            previous_hash,
            transaction,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            nonce: rand::thread_rng().gen_range(0..=MAX_NONCE),
            proof: 0,
        }
    }

    pub fn genesis(initial_supply: u64, authority: AccountKey) -> Self {
        Self::new(
            GENESIS_PREVIOUS_HASH,
            Transaction::genesis_mint(initial_supply, authority),
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash == GENESIS_PREVIOUS_HASH && self.transaction.is_genesis_mint()
    }

    /// Content hash over the full block, nonce and linkage included.
    pub fn hash(&self) -> Result<Sha256Hash, ChainError> {
        content_hash(self)
    }

    pub fn hash_str(&self) -> Result<String, ChainError> {
        Ok(hash_to_hex(&self.hash()?))
    }
}

/// Append-only, hash-linked block store.
///
/// Reads go through a `RwLock` that is only write-locked for the instant a
/// block is pushed, so mining never blocks readers. Appends are serialized by
/// an async lock held from linking to commit.
pub struct LedgerStore {
    blocks: RwLock<Vec<Block>>,
    seal: OnceCell<CredentialSeal>,
    append_lock: tokio::sync::Mutex<()>,
    miner: Miner,
}

impl LedgerStore {
    /// Create an empty, uninitialized store.
    pub fn new(miner: Miner) -> Self {
        LedgerStore {
            blocks: RwLock::new(Vec::new()),
            seal: OnceCell::new(),
            append_lock: tokio::sync::Mutex::new(()),
            miner,
        }
    }

    /// Mint `initial_supply` to `authority` in the genesis block.
    ///
    /// Succeeds once per store; the returned credential is the only one the
    /// store will ever accept.
    pub fn initialize(
        &self,
        initial_supply: u64,
        authority: AccountKey,
    ) -> Result<ManagerCredential, ChainError> {
        let credential = ManagerCredential::issue(authority.clone());
        let genesis = Block::genesis(initial_supply, authority);
        let genesis_hash = genesis.hash_str()?;

        let mut blocks = self.blocks.write();
        self.seal
            .set(credential.seal())
            .map_err(|_| ChainError::AlreadyInitialized)?;
        blocks.push(genesis);

        info!(
            "Created genesis block {} minting {} to {}",
            genesis_hash,
            initial_supply,
            credential.authority().fingerprint()
        );
        Ok(credential)
    }

    pub fn is_initialized(&self) -> bool {
        self.seal.get().is_some()
    }

    fn authorize(&self, credential: &ManagerCredential) -> Result<(), ChainError> {
        match self.seal.get() {
            Some(seal) => seal.check(credential),
            None => Err(ChainError::Unauthorized(
                "Ledger store has not been initialized".to_string(),
            )),
        }
    }

    /// Most recently appended block.
    pub fn current_head(&self) -> Result<Block, ChainError> {
        self.blocks.read().last().cloned().ok_or(ChainError::EmptyChain)
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verify, mine and commit one transaction.
    ///
    /// Every transition is reported to `listener`; the terminal status is also
    /// returned. Only credential failures and unhashable input surface as `Err`.
    /// Dropping the returned future before it completes reports `Error`.
    pub async fn append_block(
        &self,
        credential: &ManagerCredential,
        transaction: Transaction,
        sender: &AccountKey,
        signature: &[u8],
        listener: &dyn StatusListener,
    ) -> Result<TransactionStatus, ChainError> {
        self.authorize(credential)?;
        let tx_hash = transaction.hash()?;

        if let Err(e) = transaction.verify_signature(sender, signature) {
            warn!("Rejecting transaction {}: {}", hash_to_hex(&tx_hash), e);
            listener.on_status(&tx_hash, TransactionStatus::Invalid);
            return Ok(TransactionStatus::Invalid);
        }
        debug!("Signature verified for {}", hash_to_hex(&tx_hash));

        let mut attempt = AttemptGuard::new(listener, tx_hash);
        let _append_guard = self.append_lock.lock().await;
        attempt.report(TransactionStatus::Processing);

        match self.mine_and_commit(transaction).await {
            Ok(block) => {
                info!(
                    "Committed block {} (height {}) for transaction {}",
                    hash_to_hex(&block),
                    self.len() - 1,
                    hash_to_hex(&tx_hash)
                );
                attempt.report(TransactionStatus::Committed);
                Ok(TransactionStatus::Committed)
            }
            Err(e) => {
                warn!("Discarding candidate for {}: {}", hash_to_hex(&tx_hash), e);
                attempt.report(TransactionStatus::Error);
                Ok(TransactionStatus::Error)
            }
        }
    }

    /// Caller must hold the append lock.
    async fn mine_and_commit(&self, transaction: Transaction) -> Result<Sha256Hash, ChainError> {
        let previous_hash = self.current_head()?.hash()?;
        let mut candidate = Block::new(previous_hash, transaction);
        candidate.proof = self.miner.mine(candidate.nonce).await?;
        let block_hash = candidate.hash()?;

        let mut blocks = self.blocks.write();
        let head = blocks.last().map(Block::hash).transpose()?;
        if head != Some(previous_hash) {
            return Err(ChainError::InvalidBlock(
                "Chain head moved while mining".to_string(),
            ));
        }
        blocks.push(candidate);
        Ok(block_hash)
    }

    /// Every block matching `predicate`, oldest first.
    ///
    /// An uninitialized store is empty and yields no blocks.
    pub fn search<F>(
        &self,
        credential: &ManagerCredential,
        predicate: F,
    ) -> Result<Vec<Block>, ChainError>
    where
        F: Fn(&Block) -> bool,
    {
        // Nothing to protect before genesis.
        if !self.is_initialized() {
            return Ok(Vec::new());
        }
        self.authorize(credential)?;
        let blocks = self.blocks.read();
        Ok(blocks.iter().filter(|b| predicate(b)).cloned().collect())
    }

    pub fn all(&self, credential: &ManagerCredential) -> Result<Vec<Block>, ChainError> {
        self.search(credential, |_| true)
    }

    /// Check genesis shape, linkage and proof-of-work of the whole chain.
    pub fn validate(&self, credential: &ManagerCredential) -> Result<(), ChainError> {
        self.authorize(credential)?;
        validate_chain(&self.blocks.read())
    }

    /// Cancel mining in flight; later appends end with status `Error`.
    pub fn shutdown(&self) {
        info!("Shutting down ledger store miner");
        self.miner.shutdown();
    }
}

/// Reports `Error` for an append attempt abandoned before a terminal status.
struct AttemptGuard<'a> {
    listener: &'a dyn StatusListener,
    tx_hash: Sha256Hash,
    finished: bool,
}

impl<'a> AttemptGuard<'a> {
    fn new(listener: &'a dyn StatusListener, tx_hash: Sha256Hash) -> Self {
        AttemptGuard {
            listener,
            tx_hash,
            finished: false,
        }
    }

    fn report(&mut self, status: TransactionStatus) {
        self.listener.on_status(&self.tx_hash, status);
        self.finished = status.is_terminal();
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Append of {} abandoned by its caller", hash_to_hex(&self.tx_hash));
            self.listener.on_status(&self.tx_hash, TransactionStatus::Error);
        }
    }
}
