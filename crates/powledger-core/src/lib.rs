//! Minimal append-only ledger: signed transfers sealed into proof-of-work
//! blocks, with balances and validity re-derived from genesis on demand.

pub mod block;
pub mod chain;
pub mod constants;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod pow;
pub mod transaction;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use block::Block;
pub use chain::{Chain, ChainConfig, ChainViolation};
pub use crypto::{KeyPair, Secp256k1Signer, Signer};
pub use error::{LedgerError, Result};
pub use pow::CancelToken;
pub use transaction::Transaction;

pub type Hash = [u8; 32];

pub fn sha256(bytes: &[u8]) -> Hash {
    Sha256::digest(bytes).into()
}

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Public identifier used as transaction sender and recipient. For the
/// secp256k1 signer this is the hex-encoded uncompressed public key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}
