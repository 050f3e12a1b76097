//! Ordered batch of transactions sealed by a proof-of-work hash.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{GENESIS_DATA, GENESIS_TIMESTAMP};
use crate::crypto::Signer;
use crate::encoding::{self, Encoder};
use crate::error::Result;
use crate::pow::{self, CancelToken};
use crate::transaction::Transaction;
use crate::{sha256, Hash};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Free-form payload; only the genesis block carries one.
    #[serde(default)]
    pub data: Option<String>,
    pub transactions: Vec<Transaction>,
    #[serde(with = "encoding::hex_serde::hash")]
    pub previous_hash: Hash,
    pub nonce: u64,
    /// Hash claimed at sealing time. Validation compares it against
    /// [`Block::calculate_hash`].
    #[serde(with = "encoding::hex_serde::hash")]
    pub hash: Hash,
}

/// Pure digest over (timestamp, data, transactions, previous hash, nonce).
pub fn block_hash(
    timestamp: u64,
    data: Option<&str>,
    transactions: &[Transaction],
    previous_hash: &Hash,
    nonce: u64,
) -> Hash {
    let mut enc = Encoder::versioned();
    enc.u64(timestamp).opt(data.map(str::as_bytes));
    encoding::encode_transactions(&mut enc, transactions);
    enc.fixed(previous_hash).u64(nonce);
    sha256(&enc.finish())
}

impl Block {
    pub fn new(timestamp: u64, transactions: Vec<Transaction>, previous_hash: Hash) -> Self {
        Self::with_data(timestamp, None, transactions, previous_hash)
    }

    pub fn with_data(
        timestamp: u64,
        data: Option<String>,
        transactions: Vec<Transaction>,
        previous_hash: Hash,
    ) -> Self {
        let hash = block_hash(timestamp, data.as_deref(), &transactions, &previous_hash, 0);
        Self {
            timestamp,
            data,
            transactions,
            previous_hash,
            nonce: 0,
            hash,
        }
    }

    /// Fixed first block: no transactions, zero previous hash, never mined.
    pub fn genesis() -> Self {
        Self::with_data(
            GENESIS_TIMESTAMP,
            Some(GENESIS_DATA.to_string()),
            Vec::new(),
            [0u8; 32],
        )
    }

    pub fn calculate_hash(&self) -> Hash {
        self.hash_with_nonce(self.nonce)
    }

    fn hash_with_nonce(&self, nonce: u64) -> Hash {
        block_hash(
            self.timestamp,
            self.data.as_deref(),
            &self.transactions,
            &self.previous_hash,
            nonce,
        )
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Seal the block: search nonces upward from the current one until the
    /// hash has `difficulty` leading zero hex digits. Unbounded and blocking.
    pub fn mine_block(&mut self, difficulty: u32) {
        let (nonce, hash) =
            pow::search_unbounded(self.nonce, difficulty, |n| self.hash_with_nonce(n));
        self.seal(nonce, hash);
    }

    /// Like [`Block::mine_block`] but optionally parallel and cancellable.
    /// On cancellation the block is left untouched.
    pub fn mine_block_with(
        &mut self,
        difficulty: u32,
        parallel: bool,
        cancel: Option<&CancelToken>,
    ) -> Result<()> {
        let (nonce, hash) = if parallel {
            pow::search_parallel(self.nonce, difficulty, cancel, |n| self.hash_with_nonce(n))?
        } else {
            pow::search(self.nonce, difficulty, cancel, |n| self.hash_with_nonce(n))?
        };
        self.seal(nonce, hash);
        Ok(())
    }

    fn seal(&mut self, nonce: u64, hash: Hash) {
        self.nonce = nonce;
        self.hash = hash;
        info!("Block mined: nonce {} hash {}", nonce, self.hash_hex());
    }

    /// True iff every transaction verifies. Stops at the first `false`;
    /// a missing signature surfaces as `Err(MissingSignature)`.
    pub fn has_valid_transactions<S: Signer>(&self, signer: &S) -> Result<bool> {
        for tx in &self.transactions {
            if !tx.is_valid(signer)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
