//! Key/address facility: the signing primitive consumed by transactions.
//!
//! The core never talks to an elliptic curve directly. It goes through the
//! [`Signer`] trait so tests can inject a mock and so the curve context is
//! owned by whoever builds the chain instead of living in a global.

use rand::rngs::OsRng;
use secp256k1::{ecdsa::Signature, All, Message, PublicKey, Secp256k1, SecretKey};

use crate::error::{LedgerError, Result};
use crate::{Address, Hash};

/// Stateless sign/verify pair over 32-byte digests.
pub trait Signer: Send + Sync {
    type Key;

    /// Public address belonging to `key`.
    fn address_of(&self, key: &Self::Key) -> Address;

    fn sign(&self, key: &Self::Key, digest: &Hash) -> Result<Vec<u8>>;

    /// `Ok(false)` means the signature was checked and does not match.
    /// `Err(InvalidAddress)` means the address cannot be turned into a
    /// verification key at all.
    fn verify(&self, address: &Address, digest: &Hash, signature: &[u8]) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secp = Secp256k1::signing_only();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| LedgerError::InvalidKey(format!("invalid hex: {e}")))?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|e| LedgerError::InvalidKey(e.to_string()))?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Hex-encoded uncompressed public key (`04 || x || y`).
    pub fn address(&self) -> Address {
        Address::new(hex::encode(self.public_key.serialize_uncompressed()))
    }
}

/// ECDSA over secp256k1 with DER-encoded signatures.
pub struct Secp256k1Signer {
    ctx: Secp256k1<All>,
}

impl Secp256k1Signer {
    pub fn new() -> Self {
        Self {
            ctx: Secp256k1::new(),
        }
    }
}

impl Default for Secp256k1Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer for Secp256k1Signer {
    type Key = KeyPair;

    fn address_of(&self, key: &KeyPair) -> Address {
        key.address()
    }

    fn sign(&self, key: &KeyPair, digest: &Hash) -> Result<Vec<u8>> {
        let msg = Message::from_digest(*digest);
        let sig = self.ctx.sign_ecdsa(&msg, &key.secret_key);
        Ok(sig.serialize_der().to_vec())
    }

    fn verify(&self, address: &Address, digest: &Hash, signature: &[u8]) -> Result<bool> {
        let bytes = hex::decode(address.as_str())
            .map_err(|e| LedgerError::InvalidAddress(format!("{address}: {e}")))?;
        let public_key = PublicKey::from_slice(&bytes)
            .map_err(|e| LedgerError::InvalidAddress(format!("{address}: {e}")))?;
        let Ok(sig) = Signature::from_der(signature) else {
            return Ok(false);
        };
        let msg = Message::from_digest(*digest);
        Ok(self.ctx.verify_ecdsa(&msg, &sig, &public_key).is_ok())
    }
}
