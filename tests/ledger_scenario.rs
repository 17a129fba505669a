//! End-to-end ledger behaviour: signed transfers, mining and balances

use std::collections::HashSet;

use pow_ledger::{Address, Blockchain, Hashable, LedgerConfig, Transaction, Wallet};

const REWARD: f64 = 1.0;

fn ledger(coinbase: &Wallet) -> Blockchain {
    let config = LedgerConfig::default()
        .with_difficulty(2)
        .with_mining_reward(REWARD);
    Blockchain::with_config(coinbase.address().clone(), config)
}

fn submit(blockchain: &Blockchain, sender: &Wallet, recipient: &Address, amount: f64) -> bool {
    let transaction = Transaction::new(sender.address().clone(), recipient.clone(), amount);
    let signature = transaction.sign_with_key(sender.private_key()).unwrap();

    blockchain.add_transaction(
        sender.address().clone(),
        recipient.clone(),
        amount,
        sender.public_key().clone(),
        signature,
    )
}

#[test]
fn test_transfer_then_mine() {
    let coinbase = Wallet::new().unwrap();
    let alice = Wallet::new().unwrap();
    let bob = Wallet::new().unwrap();
    let blockchain = ledger(&coinbase);

    assert!(submit(&blockchain, &alice, bob.address(), 10.0));
    blockchain.mine().unwrap();

    assert_eq!(blockchain.chain().len(), 2);
    assert_eq!(blockchain.balance(alice.address()), -10.0);
    assert_eq!(blockchain.balance(bob.address()), 10.0);
    assert_eq!(blockchain.balance(coinbase.address()), REWARD);

    // Signature produced by Bob over a transfer out of Alice's address
    let forged = Transaction::new(alice.address().clone(), bob.address().clone(), 5.0);
    let signature = forged.sign_with_key(bob.private_key()).unwrap();
    let pool_before = blockchain.pending_transactions().len();

    assert!(!blockchain.add_transaction(
        alice.address().clone(),
        bob.address().clone(),
        5.0,
        alice.public_key().clone(),
        signature,
    ));
    assert_eq!(blockchain.pending_transactions().len(), pool_before);
}

#[test]
fn test_pool_lifecycle() {
    let coinbase = Wallet::new().unwrap();
    let alice = Wallet::new().unwrap();
    let bob = Wallet::new().unwrap();
    let blockchain = ledger(&coinbase);

    assert!(submit(&blockchain, &alice, bob.address(), 1.5));
    assert!(submit(&blockchain, &bob, alice.address(), 0.5));
    let snapshot = blockchain.pending_transactions();

    let block = blockchain.mine().unwrap();

    assert!(blockchain.pending_transactions().is_empty());
    assert_eq!(block.transactions.len(), snapshot.len() + 1);
    for (committed, pending) in block.transactions.iter().zip(&snapshot) {
        assert_eq!(*committed, pending.committed());
    }

    let reward = block.transactions.last().unwrap();
    assert!(reward.is_coinbase());
    assert_eq!(reward.recipient, *coinbase.address());
    assert_eq!(reward.amount, REWARD);

    assert!(block.hash_hex().starts_with("00"));
    assert_eq!(block.previous_hash, blockchain.chain()[0].hash());
}

#[test]
fn test_value_is_conserved() {
    let coinbase = Wallet::new().unwrap();
    let wallets: Vec<Wallet> = (0..3).map(|_| Wallet::new().unwrap()).collect();
    let blockchain = ledger(&coinbase);

    for round in 0..3 {
        for (index, sender) in wallets.iter().enumerate() {
            let recipient = wallets[(index + 1) % wallets.len()].address();
            assert!(submit(&blockchain, sender, recipient, (round + index + 1) as f64));
        }
        assert!(submit(&blockchain, &coinbase, wallets[0].address(), 0.25));
        blockchain.mine().unwrap();
    }

    let mut participants = HashSet::new();
    for block in blockchain.chain() {
        for transaction in &block.transactions {
            if !transaction.is_coinbase() {
                participants.insert(transaction.sender.clone());
            }
            participants.insert(transaction.recipient.clone());
        }
    }

    let total: f64 = participants
        .iter()
        .map(|address| blockchain.balance(address))
        .sum();
    let issued = REWARD * (blockchain.chain().len() - 1) as f64;

    assert!((total - issued).abs() < 1e-9);
    assert!(blockchain.is_valid());
}
