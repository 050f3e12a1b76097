//! A single value transfer and its signature.

use serde::{Deserialize, Serialize};

use crate::crypto::Signer;
use crate::encoding::{self, Encoder};
use crate::error::{LedgerError, Result};
use crate::{sha256, Address, Hash};

/// One transfer. `sender == None` marks a system-issued mining reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Option<Address>,
    pub recipient: Address,
    pub amount: u64,
    #[serde(default, with = "encoding::hex_serde::opt_bytes")]
    pub signature: Option<Vec<u8>>,
}

impl Transaction {
    pub fn new(sender: Option<Address>, recipient: Address, amount: u64) -> Self {
        Self {
            sender,
            recipient,
            amount,
            signature: None,
        }
    }

    /// Mining reward paid to `recipient`. Needs no signature.
    pub fn reward(recipient: Address, amount: u64) -> Self {
        Self::new(None, recipient, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.sender.is_none()
    }

    /// Content hash of (sender, recipient, amount). The signature is not part
    /// of it, so this is both the signing and the verification payload.
    pub fn digest(&self) -> Hash {
        let mut enc = Encoder::versioned();
        encoding::encode_transaction_body(&mut enc, self);
        sha256(&enc.finish())
    }

    /// Sign with `key`. Fails with `KeyMismatch` before producing anything if
    /// the key's address is not the sender. Re-signing overwrites.
    pub fn sign<S: Signer>(&mut self, signer: &S, key: &S::Key) -> Result<()> {
        let actual = signer.address_of(key);
        match &self.sender {
            Some(sender) if *sender == actual => {}
            other => {
                return Err(LedgerError::KeyMismatch {
                    expected: other.clone().unwrap_or_else(|| Address::new("")),
                    actual,
                })
            }
        }
        let signature = signer.sign(key, &self.digest())?;
        self.signature = Some(signature);
        Ok(())
    }

    /// Reward transactions are always valid. Otherwise an absent signature is
    /// an error, while a signature that does not verify is `Ok(false)`.
    pub fn is_valid<S: Signer>(&self, signer: &S) -> Result<bool> {
        let Some(sender) = &self.sender else {
            return Ok(true);
        };
        let signature = match &self.signature {
            Some(sig) if !sig.is_empty() => sig,
            _ => return Err(LedgerError::MissingSignature),
        };
        signer.verify(sender, &self.digest(), signature)
    }
}
