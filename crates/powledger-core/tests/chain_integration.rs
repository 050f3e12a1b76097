mod helpers;

use std::sync::Arc;

use helpers::{create_chain, signed_transfer};
use powledger_core::{
    Address, Block, CancelToken, Chain, ChainConfig, ChainViolation, KeyPair, LedgerError,
    Secp256k1Signer, Transaction,
};

#[test]
fn test_transfer_then_reward_scenario() -> anyhow::Result<()> {
    let mut chain = create_chain(2, 100);
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();

    chain.add_transaction(signed_transfer(&chain, &alice, &bob, 10))?;
    chain.mine_pending_transactions(alice.address())?;

    assert_eq!(chain.balance_of(&alice.address()), -10);
    assert_eq!(chain.balance_of(&bob.address()), 10);
    assert_eq!(
        chain.pending(),
        &[Transaction::reward(alice.address(), 100)]
    );

    chain.mine_pending_transactions(alice.address())?;
    assert_eq!(chain.balance_of(&alice.address()), 90);
    assert_eq!(chain.len(), 3);
    assert!(chain.is_valid());
    for block in &chain.blocks()[1..] {
        assert!(block.hash_hex().starts_with("00"));
    }
    Ok(())
}

#[test]
fn test_demo_key_walkthrough() -> anyhow::Result<()> {
    let key =
        KeyPair::from_secret_hex("5d883a182fa8b41dcb5125f2a2f4a759a8da09ceac97469fc6b40e2a6c162766")?;
    let mut chain = create_chain(2, 100);

    let mut tx = Transaction::new(
        Some(key.address()),
        Address::from("public key goes here"),
        10,
    );
    tx.sign(chain.signer().as_ref(), &key)?;
    chain.add_transaction(tx)?;
    chain.mine_pending_transactions(key.address())?;

    assert_eq!(chain.balance_of(&key.address()), -10);
    assert!(chain.is_valid());

    chain.blocks_mut()[1].transactions[0].amount = 1;
    assert!(!chain.is_valid());
    Ok(())
}

#[test]
fn test_signing_with_foreign_key_fails() {
    let chain = create_chain(1, 100);
    let alice = KeyPair::generate();
    let mallory = KeyPair::generate();

    let mut tx = Transaction::new(Some(alice.address()), mallory.address(), 10);
    let err = tx.sign(chain.signer().as_ref(), &mallory).unwrap_err();
    assert!(matches!(err, LedgerError::KeyMismatch { .. }));
    assert!(tx.signature.is_none());
}

#[test]
fn test_submission_errors_leave_pool_untouched() -> anyhow::Result<()> {
    let mut chain = create_chain(1, 100);
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();

    let mut forged = signed_transfer(&chain, &alice, &bob, 10);
    forged.recipient = KeyPair::generate().address();
    assert!(matches!(
        chain.add_transaction(forged),
        Err(LedgerError::InvalidTransaction)
    ));

    let unsigned = Transaction::new(Some(alice.address()), bob.address(), 1);
    assert!(matches!(
        chain.add_transaction(unsigned),
        Err(LedgerError::MissingSignature)
    ));

    let mut bogus_sender = Transaction::new(Some(Address::from("not a key")), bob.address(), 1);
    bogus_sender.signature = Some(vec![1, 2, 3]);
    assert!(matches!(
        chain.add_transaction(bogus_sender),
        Err(LedgerError::InvalidAddress(_))
    ));

    assert!(matches!(
        chain.add_transaction(Transaction::reward(bob.address(), 5)),
        Err(LedgerError::IncompleteTransaction)
    ));

    assert!(chain.pending().is_empty());
    Ok(())
}

#[test]
fn test_transfers_conserve_total_balance() -> anyhow::Result<()> {
    let mut chain = create_chain(1, 100);
    let keys: Vec<KeyPair> = (0..4).map(|_| KeyPair::generate()).collect();

    for round in 0..3u64 {
        for (i, from) in keys.iter().enumerate() {
            let to = &keys[(i + 1 + round as usize) % keys.len()];
            chain.add_transaction(signed_transfer(&chain, from, to, 3 + round * i as u64))?;
        }
        chain.mine_pending_transactions(keys[0].address())?;
    }

    // Every block after the first carries one reward of 100.
    let rewards = 100 * (chain.len() as i128 - 2);
    let total: i128 = keys.iter().map(|k| chain.balance_of(&k.address())).sum();
    assert_eq!(total, rewards);
    assert!(chain.is_valid());
    Ok(())
}

#[test]
fn test_swapped_blocks_invalidate_chain() -> anyhow::Result<()> {
    let mut chain = create_chain(1, 100);
    let miner = KeyPair::generate();
    for _ in 0..3 {
        chain.mine_pending_transactions(miner.address())?;
    }
    assert!(chain.is_valid());

    chain.blocks_mut().swap(1, 2);
    assert_eq!(chain.validate(), Err(ChainViolation::BrokenLink { index: 1 }));
    Ok(())
}

#[test]
fn test_resealed_tampering_still_breaks_links() -> anyhow::Result<()> {
    let mut chain = create_chain(1, 100);
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    chain.add_transaction(signed_transfer(&chain, &alice, &bob, 10))?;
    chain.mine_pending_transactions(alice.address())?;
    chain.mine_pending_transactions(alice.address())?;
    chain.mine_pending_transactions(alice.address())?;

    // Re-mining a rewritten block makes it self-consistent; its successor
    // still points at the old hash.
    let block = &mut chain.blocks_mut()[2];
    block.transactions[0].amount = 1_000;
    block.mine_block(1);
    assert_eq!(chain.validate(), Err(ChainViolation::BrokenLink { index: 3 }));
    Ok(())
}

#[test]
fn test_parallel_chain_matches_difficulty() -> anyhow::Result<()> {
    let config = ChainConfig {
        difficulty: 3,
        mining_reward: 50,
        parallel_mining: true,
    };
    let mut chain = Chain::new(Arc::new(Secp256k1Signer::new()), config)?;
    let miner = KeyPair::generate();
    chain.mine_pending_transactions(miner.address())?;
    chain.mine_pending_transactions(miner.address())?;

    assert!(chain.latest_block().hash_hex().starts_with("000"));
    assert_eq!(chain.balance_of(&miner.address()), 50);
    assert!(chain.is_valid());
    Ok(())
}

#[test]
fn test_cancelled_mining_keeps_pool_for_next_cycle() -> anyhow::Result<()> {
    let mut chain = create_chain(2, 100);
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    chain.add_transaction(signed_transfer(&chain, &alice, &bob, 10))?;

    let token = CancelToken::new();
    token.cancel();
    assert!(chain
        .mine_pending_transactions_cancellable(alice.address(), &token)
        .is_err());
    assert_eq!(chain.len(), 1);

    chain.mine_pending_transactions(alice.address())?;
    assert_eq!(chain.balance_of(&bob.address()), 10);
    Ok(())
}

#[test]
fn test_exported_json_round_trips_blocks() -> anyhow::Result<()> {
    let mut chain = create_chain(1, 100);
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    chain.add_transaction(signed_transfer(&chain, &alice, &bob, 10))?;
    chain.mine_pending_transactions(alice.address())?;

    let json: serde_json::Value = serde_json::from_str(&chain.to_json()?)?;
    let blocks: Vec<Block> = serde_json::from_value(json["blocks"].clone())?;
    assert_eq!(blocks, chain.blocks());
    assert_eq!(json["difficulty"], 1);
    Ok(())
}
