//! User registry mapping account fingerprints to human-readable usernames
//!
//! The ledger never consults the registry; it is a display projection used to
//! label transaction records after the fact.

use crate::crypto::AccountKey;
use crate::digest::Fingerprint;
use crate::error::ChainError;
use crate::transaction::TransactionRecord;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const MAX_USERNAME_LENGTH: usize = 64;

/// Label used for fingerprints with no registered user.
pub const UNKNOWN_USER: &str = "unknown";

/// Registered user with audit timestamps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Fingerprint of `public_key`; the registry key
    pub id: Fingerprint,

    /// Display name (case-preserved, unique ignoring case)
    pub username: String,

    pub public_key: AccountKey,

    /// RFC3339 timestamp when the user was created
    pub created_at: String,

    /// RFC3339 timestamp of last modification
    pub updated_at: String,

    /// Number of times this user has been modified
    pub version: u32,
}

impl User {
    pub fn new(username: impl Into<String>, public_key: AccountKey) -> Result<Self, ChainError> {
        let username = username.into().trim().to_string();
        validate_username(&username)?;
        let now = chrono::Utc::now().to_rfc3339();

        Ok(User {
            id: public_key.fingerprint(),
            username,
            public_key,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        })
    }
}

/// Thread-safe, in-memory user registry
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    users: HashMap<Fingerprint, User>,

    /// Lowercase username -> id
    username_index: HashMap<String, Fingerprint>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `user`, returning its id.
    pub fn create(&self, user: User) -> Result<Fingerprint, ChainError> {
        validate_username(&user.username)?;
        let mut inner = self.inner.write();

        let key = user.username.to_lowercase();
        if inner.username_index.contains_key(&key) {
            return Err(ChainError::UsernameTaken(user.username));
        }
        if inner.users.contains_key(&user.id) {
            return Err(ChainError::AccountExists(user.id.to_hex()));
        }

        let id = user.id;
        debug!("Registered user '{}' as {}", user.username, id);
        inner.username_index.insert(key, id);
        inner.users.insert(id, user);
        Ok(id)
    }

    pub fn read(&self, id: &Fingerprint) -> Option<User> {
        self.inner.read().users.get(id).cloned()
    }

    /// Case-insensitive lookup by username.
    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let inner = self.inner.read();
        inner
            .username_index
            .get(&username.trim().to_lowercase())
            .and_then(|id| inner.users.get(id))
            .cloned()
    }

    /// Rename the user registered under `id`.
    pub fn update(&self, id: &Fingerprint, new_username: &str) -> Result<User, ChainError> {
        let new_username = new_username.trim().to_string();
        validate_username(&new_username)?;

        let mut inner = self.inner.write();
        let old_key = inner
            .users
            .get(id)
            .ok_or_else(|| ChainError::UserNotFound(id.to_hex()))?
            .username
            .to_lowercase();

        let new_key = new_username.to_lowercase();
        if new_key != old_key && inner.username_index.contains_key(&new_key) {
            return Err(ChainError::UsernameTaken(new_username));
        }

        inner.username_index.remove(&old_key);
        inner.username_index.insert(new_key, *id);

        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| ChainError::UserNotFound(id.to_hex()))?;
        user.username = new_username;
        user.updated_at = chrono::Utc::now().to_rfc3339();
        user.version = user.version.saturating_add(1);
        Ok(user.clone())
    }

    pub fn delete(&self, id: &Fingerprint) -> Result<User, ChainError> {
        let mut inner = self.inner.write();
        let user = inner
            .users
            .remove(id)
            .ok_or_else(|| ChainError::UserNotFound(id.to_hex()))?;
        inner.username_index.remove(&user.username.to_lowercase());
        Ok(user)
    }

    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Username registered for a hex fingerprint, or [`UNKNOWN_USER`].
    pub fn label(&self, fingerprint_hex: &str) -> String {
        Fingerprint::from_hex(fingerprint_hex)
            .ok()
            .and_then(|id| self.read(&id))
            .map_or_else(|| UNKNOWN_USER.to_string(), |user| user.username)
    }

    /// Replace payer and payee fingerprints with usernames.
    pub fn map_transactions(&self, records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
        records
            .into_iter()
            .map(|record| TransactionRecord {
                payer: self.label(&record.payer),
                payee: self.label(&record.payee),
                ..record
            })
            .collect()
    }
}

fn validate_username(username: &str) -> Result<(), ChainError> {
    if username.is_empty() {
        return Err(ChainError::InvalidUsername(
            "Username cannot be empty".to_string(),
        ));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ChainError::InvalidUsername(format!(
            "Username too long (max {} characters)",
            MAX_USERNAME_LENGTH
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "-_.".contains(c))
    {
        return Err(ChainError::InvalidUsername(format!(
            "'{}' contains invalid characters",
            username
        )));
    }

    Ok(())
}
