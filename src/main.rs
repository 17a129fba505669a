use anyhow::{Context, Result};
use log::{info, warn};

use pow_ledger::{Block, Blockchain, Hashable, LedgerConfig, Transaction, Wallet};

// Print a single block in the console layout
fn print_block(block: &Block) {
    println!("timestamp       : {}", block.timestamp.timestamp_nanos_opt().unwrap_or_default());
    println!("previous_hash   : {}", hex::encode(block.previous_hash));
    println!("nonce           : {}", block.nonce);
    println!("transactions    :");
    for transaction in &block.transactions {
        print_transaction(transaction);
    }
    println!();
}

fn print_transaction(transaction: &Transaction) {
    println!("        {}", "-".repeat(44));
    println!("        sender    : {}", transaction.sender);
    println!("        recipient : {}", transaction.recipient);
    println!("        amount    : {:.1}", transaction.amount);
}

fn print_chain(blockchain: &Blockchain) {
    for (index, block) in blockchain.chain().iter().enumerate() {
        println!("{} chain {} {}", "<=".repeat(16), index, "=>".repeat(16));
        print_block(block);
    }
    println!("{}", "*".repeat(60));
}

// Sign a transfer with the sender's wallet and hand it to the ledger
fn transfer(blockchain: &Blockchain, sender: &Wallet, recipient: &Wallet, amount: f64) -> Result<bool> {
    let transaction = Transaction::new(sender.address().clone(), recipient.address().clone(), amount);
    let signature = transaction
        .sign_with_key(sender.private_key())
        .context("failed to sign transfer")?;

    Ok(blockchain.add_transaction(
        sender.address().clone(),
        recipient.address().clone(),
        amount,
        sender.public_key().clone(),
        signature,
    ))
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = LedgerConfig::from_env();

    let miner = Wallet::new().context("failed to create miner wallet")?;
    let alice = Wallet::new().context("failed to create wallet")?;
    let bob = Wallet::new().context("failed to create wallet")?;

    info!("Miner address: {}", miner.address());
    info!("Miner public key: {}", miner.public_key_hex());
    info!("Alice address: {}", alice.address());
    info!("Bob address: {}", bob.address());

    let blockchain = Blockchain::with_config(miner.address().clone(), config);

    blockchain.mine().context("mining failed")?;

    transfer(&blockchain, &miner, &alice, 0.5)?;
    transfer(&blockchain, &alice, &bob, 0.2)?;

    // Bob signs a transfer that claims to come from Alice
    let forged = Transaction::new(alice.address().clone(), bob.address().clone(), 10.0);
    let signature = forged.sign_with_key(bob.private_key())?;
    if !blockchain.add_transaction(
        alice.address().clone(),
        bob.address().clone(),
        10.0,
        alice.public_key().clone(),
        signature,
    ) {
        warn!("Forged transfer from Alice to Bob was refused");
    }

    let block = blockchain.mine().context("mining failed")?;
    info!("Latest block hash: {}", block.hash_hex());

    print_chain(&blockchain);

    for (name, wallet) in [("miner", &miner), ("alice", &alice), ("bob", &bob)] {
        println!("{:<6} {:>8.1}", name, blockchain.balance(wallet.address()));
    }
    println!("chain valid: {}", blockchain.is_valid());

    Ok(())
}
