use std::sync::Arc;

use powledger_core::{Chain, ChainConfig, KeyPair, Secp256k1Signer, Transaction};

pub fn create_chain(difficulty: u32, mining_reward: u64) -> Chain<Secp256k1Signer> {
    let config = ChainConfig {
        difficulty,
        mining_reward,
        parallel_mining: false,
    };
    Chain::new(Arc::new(Secp256k1Signer::new()), config).expect("valid config")
}

pub fn signed_transfer(
    chain: &Chain<Secp256k1Signer>,
    from: &KeyPair,
    to: &KeyPair,
    amount: u64,
) -> Transaction {
    let mut tx = Transaction::new(Some(from.address()), to.address(), amount);
    tx.sign(chain.signer().as_ref(), from)
        .expect("sender key signs its own transaction");
    tx
}
