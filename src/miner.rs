//! Proof-of-work admission gate.
//!
//! A block is admitted only after finding the smallest `solution` such that the
//! BLAKE3 digest of the decimal string `nonce + solution` starts with
//! [`DIFFICULTY_PREFIX`]. The target is fixed; there is no difficulty adjustment.

use crate::config::MinerConfig;
use crate::digest::leading_zero_nibbles;
use crate::error::ChainError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Required hex prefix of an attempt digest.
pub const DIFFICULTY_PREFIX: &str = "0000";

const DIFFICULTY_NIBBLES: usize = DIFFICULTY_PREFIX.len();

/// Attempts between two checks of the cancel flags.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

fn attempt_digest(nonce: u64, solution: u64) -> [u8; 32] {
    let attempt = nonce.wrapping_add(solution).to_string();
    *blake3::hash(attempt.as_bytes()).as_bytes()
}

/// Whether `solution` satisfies the difficulty target for `nonce`.
pub fn meets_difficulty(nonce: u64, solution: u64) -> bool {
    leading_zero_nibbles(&attempt_digest(nonce, solution)) >= DIFFICULTY_NIBBLES
}

fn search(nonce: u64, should_stop: impl Fn() -> bool) -> Option<u64> {
    let mut solution = 0u64;
    loop {
        if solution % CANCEL_CHECK_INTERVAL == 0 && should_stop() {
            return None;
        }
        if meets_difficulty(nonce, solution) {
            return Some(solution);
        }
        solution = solution.wrapping_add(1);
    }
}

/// Smallest non-negative solution for `nonce`. Unbounded.
pub fn proof_of_work(nonce: u64) -> u64 {
    match search(nonce, || false) {
        Some(solution) => solution,
        None => unreachable!("search without a stop condition never gives up"),
    }
}

/// Same search as [`proof_of_work`], abandoned once `cancel` is set.
pub fn proof_of_work_cancellable(nonce: u64, cancel: &AtomicBool) -> Option<u64> {
    search(nonce, || cancel.load(Ordering::Relaxed))
}

/// Runs proof-of-work on the blocking pool so mining never stalls the async runtime.
#[derive(Debug, Clone)]
pub struct Miner {
    timeout: Option<Duration>,
    shutdown: Arc<AtomicBool>,
}

impl Miner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &MinerConfig) -> Self {
        Self::new(config.timeout())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Abort every search in flight and refuse new ones.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Find the solution for `nonce` on a worker thread.
    ///
    /// Timeout and shutdown both surface as [`ChainError::MiningCancelled`].
    pub async fn mine(&self, nonce: u64) -> Result<u64, ChainError> {
        if self.is_shut_down() {
            return Err(ChainError::MiningCancelled("miner is shut down".to_string()));
        }

        let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
        let worker_cancel = Arc::clone(&cancel.0);
        let worker_shutdown = Arc::clone(&self.shutdown);
        let started = Instant::now();

        let handle = tokio::task::spawn_blocking(move || {
            search(nonce, || {
                worker_cancel.load(Ordering::Relaxed) || worker_shutdown.load(Ordering::Relaxed)
            })
        });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Proof-of-work for nonce {} timed out after {:?}", nonce, limit);
                    return Err(ChainError::MiningCancelled(format!(
                        "timed out after {:?}",
                        limit
                    )));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Some(solution)) => {
                debug!(
                    "Solved nonce {} with {} in {:?}",
                    nonce,
                    solution,
                    started.elapsed()
                );
                Ok(solution)
            }
            Ok(None) => Err(ChainError::MiningCancelled(
                "shutdown requested".to_string(),
            )),
            Err(e) => Err(ChainError::MiningFailed(format!("worker failed: {}", e))),
        }
    }
}

/// Stops the worker once the awaiting side goes away, whether it finished,
/// timed out or was dropped by its caller.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(None)
    }
}
