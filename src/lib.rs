//! ProofLedger - A single-node, hash-chained ledger with proof-of-work admission
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Block structure, the append-only ledger store and chain validation
//! - [`transaction`] - Transfer types, intake checks and display records
//! - [`status`] - Transaction status lifecycle and listeners
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work search and cancellable mining
//!
//! ## Cryptography
//! - [`crypto`] - Signatures and verification (secp256k1)
//! - [`digest`] - Content hashes and account fingerprints
//! - [`credential`] - Manager credential guarding ledger mutation
//!
//! ## State Management
//! - [`authority`] - Issuing authority: intake, commit and settlement
//! - [`cache`] - Balance cache and per-account locks
//! - [`wallet`] - Account handles that sign transfers
//! - [`registry`] - Username registry for labelling records
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod status;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod credential;
pub mod crypto;
pub mod digest;

// ============================================================================
// State Management
// ============================================================================
pub mod authority;
pub mod cache;
pub mod registry;
pub mod wallet;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;

pub use authority::IssuingAuthority;
pub use error::{ChainError, Result};
pub use wallet::Wallet;
