//! Nonce search for proof-of-work sealing.
//!
//! Difficulty counts leading zero *hex digits* of the SHA-256 digest. Both
//! search strategies return the lowest satisfying nonce at or above `start`,
//! so serial and parallel mining seal identical blocks.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::constants::NONCE_BATCH;
use crate::error::{LedgerError, Result};
use crate::Hash;

/// Cooperative cancellation flag, checked once per nonce attempt.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}

pub fn meets_difficulty(hash: &Hash, difficulty: u32) -> bool {
    count_leading_zero_nibbles(hash) >= difficulty
}

/// Serial search without cancellation. Wraps around the nonce space, so it
/// always ends with the first nonce at or above `start` whose hash meets
/// `difficulty`.
pub fn search_unbounded<F>(start: u64, difficulty: u32, hash_at: F) -> (u64, Hash)
where
    F: Fn(u64) -> Hash,
{
    let mut nonce = start;
    loop {
        let hash = hash_at(nonce);
        if meets_difficulty(&hash, difficulty) {
            return (nonce, hash);
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Serial search. Returns `(nonce, hash)` for the first nonce whose hash
/// meets `difficulty`.
pub fn search<F>(
    start: u64,
    difficulty: u32,
    cancel: Option<&CancelToken>,
    hash_at: F,
) -> Result<(u64, Hash)>
where
    F: Fn(u64) -> Hash,
{
    let mut nonce = start;
    loop {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(LedgerError::MiningCancelled);
        }
        let hash = hash_at(nonce);
        if meets_difficulty(&hash, difficulty) {
            return Ok((nonce, hash));
        }
        nonce = nonce.wrapping_add(1);
    }
}

enum Attempt {
    Found(u64, Hash),
    Cancelled,
}

/// Parallel search over consecutive batches of [`NONCE_BATCH`] nonces.
/// `find_map_first` keeps the lowest hit inside a batch, and batches are
/// scanned in order, so the result equals [`search`].
pub fn search_parallel<F>(
    start: u64,
    difficulty: u32,
    cancel: Option<&CancelToken>,
    hash_at: F,
) -> Result<(u64, Hash)>
where
    F: Fn(u64) -> Hash + Sync,
{
    let mut batch_start = start;
    loop {
        let batch_end = batch_start.saturating_add(NONCE_BATCH);
        let try_nonce = |nonce: u64| {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Some(Attempt::Cancelled);
            }
            let hash = hash_at(nonce);
            meets_difficulty(&hash, difficulty).then_some(Attempt::Found(nonce, hash))
        };
        // The last batch must include u64::MAX itself before wrapping to 0.
        let attempt = if batch_end == u64::MAX {
            (batch_start..=u64::MAX).into_par_iter().find_map_first(&try_nonce)
        } else {
            (batch_start..batch_end).into_par_iter().find_map_first(&try_nonce)
        };
        match attempt {
            Some(Attempt::Found(nonce, hash)) => return Ok((nonce, hash)),
            Some(Attempt::Cancelled) => return Err(LedgerError::MiningCancelled),
            None if batch_end == u64::MAX => batch_start = 0,
            None => batch_start = batch_end,
        }
    }
}
