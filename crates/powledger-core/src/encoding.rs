//! Explicit, order-preserving byte encoding used as hash input.
//!
//! Every variable-length field is length-prefixed (u32 LE) and every optional
//! field carries a one-byte presence tag, so two different field sequences can
//! never produce the same byte stream. The first byte of every hash input is
//! [`ENCODING_VERSION`].

use crate::constants::ENCODING_VERSION;
use crate::transaction::Transaction;

#[derive(Debug, Default)]
pub(crate) struct Encoder {
    bytes: Vec<u8>,
}

impl Encoder {
    pub(crate) fn versioned() -> Self {
        let mut enc = Self::default();
        enc.bytes.push(ENCODING_VERSION);
        enc
    }

    pub(crate) fn u64(&mut self, v: u64) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn fixed(&mut self, v: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(v);
        self
    }

    pub(crate) fn var(&mut self, v: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(&(v.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(v);
        self
    }

    pub(crate) fn opt(&mut self, v: Option<&[u8]>) -> &mut Self {
        match v {
            Some(v) => {
                self.bytes.push(1);
                self.var(v)
            }
            None => {
                self.bytes.push(0);
                self
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Fields covered by a transaction's signing digest: sender, recipient, amount.
pub(crate) fn encode_transaction_body(enc: &mut Encoder, tx: &Transaction) {
    enc.opt(tx.sender.as_ref().map(|a| a.as_str().as_bytes()))
        .var(tx.recipient.as_str().as_bytes())
        .u64(tx.amount);
}

/// Block-level encoding of the transaction list. Unlike the signing digest this
/// includes each signature, so rewriting a signature inside a sealed block
/// breaks the block hash as well.
pub(crate) fn encode_transactions(enc: &mut Encoder, txs: &[Transaction]) {
    enc.u64(txs.len() as u64);
    for tx in txs {
        encode_transaction_body(enc, tx);
        enc.opt(tx.signature.as_deref());
    }
}

/// Serde adapters rendering byte fields as lowercase hex strings.
pub mod hex_serde {
    pub mod hash {
        use crate::Hash;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(hash: &Hash, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&hex::encode(hash))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Hash, D::Error> {
            let s = String::deserialize(d)?;
            let mut out = [0u8; 32];
            hex::decode_to_slice(&s, &mut out).map_err(D::Error::custom)?;
            Ok(out)
        }
    }

    pub mod opt_bytes {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(v: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
            match v {
                Some(bytes) => s.serialize_some(&hex::encode(bytes)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|s| hex::decode(s).map_err(D::Error::custom))
                .transpose()
        }
    }
}
