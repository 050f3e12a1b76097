//! The chain: genesis plus every sealed block, the pending pool, balances and
//! whole-chain validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::block::Block;
use crate::constants::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, HASH_HEX_SIZE};
use crate::crypto::Signer;
use crate::error::{LedgerError, Result};
use crate::pow::CancelToken;
use crate::transaction::Transaction;
use crate::{now_millis, Address};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Leading zero hex digits required of every mined block hash.
    pub difficulty: u32,
    pub mining_reward: u64,
    pub parallel_mining: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            parallel_mining: false,
        }
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.difficulty == 0 {
            return Err(LedgerError::InvalidConfig(
                "difficulty must be at least one hex digit".to_string(),
            ));
        }
        if self.difficulty as usize > HASH_HEX_SIZE {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty {} exceeds the {} hex digits of a block hash",
                self.difficulty, HASH_HEX_SIZE
            )));
        }
        Ok(())
    }
}

/// First block that failed whole-chain validation, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainViolation {
    InvalidTransactions { index: usize },
    MissingSignature { index: usize },
    HashMismatch { index: usize },
    BrokenLink { index: usize },
}

impl ChainViolation {
    pub fn index(&self) -> usize {
        match self {
            Self::InvalidTransactions { index }
            | Self::MissingSignature { index }
            | Self::HashMismatch { index }
            | Self::BrokenLink { index } => *index,
        }
    }
}

impl fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransactions { index } => {
                write!(f, "block {index} contains a transaction with a bad signature")
            }
            Self::MissingSignature { index } => {
                write!(f, "block {index} contains an unsigned transfer")
            }
            Self::HashMismatch { index } => {
                write!(f, "block {index} hash does not match its contents")
            }
            Self::BrokenLink { index } => {
                write!(f, "block {index} does not link to the previous block hash")
            }
        }
    }
}

#[derive(Serialize)]
struct ChainExport<'a> {
    difficulty: u32,
    mining_reward: u64,
    blocks: &'a [Block],
    pending: &'a [Transaction],
}

/// Single-owner ledger. All mutation goes through `&mut self`, so a
/// submission can never interleave with sealing.
pub struct Chain<S: Signer> {
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
    config: ChainConfig,
    signer: Arc<S>,
}

impl<S: Signer> Chain<S> {
    pub fn new(signer: Arc<S>, config: ChainConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "chain created: difficulty {} reward {}",
            config.difficulty, config.mining_reward
        );
        Ok(Self {
            blocks: vec![Block::genesis()],
            pending: Vec::new(),
            config,
            signer,
        })
    }

    pub fn signer(&self) -> &Arc<S> {
        &self.signer
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.config.mining_reward
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Raw block access for tamper-detection tests and demos. Not part of the
    /// supported API: sealing is the only way blocks change.
    #[doc(hidden)]
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn latest_block(&self) -> &Block {
        // Genesis is pushed in `new` and blocks are never removed.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Validate and queue a transfer. Nothing is queued on error.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        let has_sender = tx.sender.as_ref().is_some_and(|a| !a.is_empty());
        if !has_sender || tx.recipient.is_empty() {
            warn!("rejected transaction without sender or recipient");
            return Err(LedgerError::IncompleteTransaction);
        }
        if !tx.is_valid(self.signer.as_ref())? {
            warn!("rejected transaction with bad signature");
            return Err(LedgerError::InvalidTransaction);
        }
        debug!("queued transaction of {} to {}", tx.amount, tx.recipient);
        self.pending.push(tx);
        Ok(())
    }

    /// Seal every pending transaction into a new block, append it, and leave a
    /// single reward for `reward_address` in the pool.
    pub fn mine_pending_transactions(&mut self, reward_address: Address) -> Result<&Block> {
        self.mine_pending(reward_address, None)
    }

    /// As [`Chain::mine_pending_transactions`], but stops with
    /// `MiningCancelled` once `cancel` fires. Blocks and pool are unchanged
    /// in that case.
    pub fn mine_pending_transactions_cancellable(
        &mut self,
        reward_address: Address,
        cancel: &CancelToken,
    ) -> Result<&Block> {
        self.mine_pending(reward_address, Some(cancel))
    }

    fn mine_pending(
        &mut self,
        reward_address: Address,
        cancel: Option<&CancelToken>,
    ) -> Result<&Block> {
        let mut block = Block::new(
            now_millis(),
            self.pending.clone(),
            self.latest_block().hash,
        );
        block.mine_block_with(self.config.difficulty, self.config.parallel_mining, cancel)?;

        info!(
            "Block {} successfully mined with {} transactions",
            self.blocks.len(),
            block.transactions.len()
        );
        self.blocks.push(block);
        self.pending = vec![Transaction::reward(reward_address, self.config.mining_reward)];
        Ok(self.latest_block())
    }

    /// Net amount received minus sent by `address`, replayed over every block.
    pub fn balance_of(&self, address: &Address) -> i128 {
        let mut balance = 0i128;
        for tx in self.blocks.iter().flat_map(|b| &b.transactions) {
            if tx.sender.as_ref() == Some(address) {
                balance -= i128::from(tx.amount);
            }
            if tx.recipient == *address {
                balance += i128::from(tx.amount);
            }
        }
        balance
    }

    /// Re-derive trust from genesis and report the first failing block.
    /// Genesis itself is trusted.
    pub fn validate(&self) -> std::result::Result<(), ChainViolation> {
        for (index, pair) in self.blocks.windows(2).enumerate() {
            let index = index + 1;
            let (previous, current) = (&pair[0], &pair[1]);

            let violation = match current.has_valid_transactions(self.signer.as_ref()) {
                Ok(true) if current.hash != current.calculate_hash() => {
                    Some(ChainViolation::HashMismatch { index })
                }
                Ok(true) if current.previous_hash != previous.hash => {
                    Some(ChainViolation::BrokenLink { index })
                }
                Ok(true) => None,
                Err(LedgerError::MissingSignature) => {
                    Some(ChainViolation::MissingSignature { index })
                }
                Ok(false) | Err(_) => Some(ChainViolation::InvalidTransactions { index }),
            };

            if let Some(violation) = violation {
                warn!("chain invalid: {violation}");
                return Err(violation);
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ChainExport {
            difficulty: self.config.difficulty,
            mining_reward: self.config.mining_reward,
            blocks: &self.blocks,
            pending: &self.pending,
        })
    }
}
