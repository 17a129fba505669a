use chrono::Utc;
use log::{debug, info, warn};
use p256::ecdsa::VerifyingKey;
use rayon::prelude::*;
use thiserror::Error;

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::block::{valid_proof, Block};
use super::codec::Hashable;
use super::config::LedgerConfig;
use super::crypto::{Address, DigitalSignature};
use super::transaction::{Transaction, TransactionError};

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("No nonce up to {max_nonce} meets difficulty {difficulty}")]
    NonceSpaceExhausted { difficulty: usize, max_nonce: u64 },

    #[error("Invalid chain: {0}")]
    InvalidChain(String),
}

/// Chain and pool, guarded together so every ledger operation is serialized
#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    pending_transactions: Vec<Transaction>,
}

impl LedgerState {
    fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("chain always holds the genesis block")
    }
}

/// Represents the blockchain
#[derive(Debug)]
pub struct Blockchain {
    state: Mutex<LedgerState>,

    /// Address credited with mining rewards
    coinbase_address: Address,

    config: LedgerConfig,
}

impl Blockchain {
    /// Creates a new blockchain with a genesis block and default mining parameters
    pub fn new(coinbase_address: Address) -> Self {
        Self::with_config(coinbase_address, LedgerConfig::default())
    }

    /// Creates a new blockchain with a genesis block
    ///
    /// # Arguments
    ///
    /// * `coinbase_address` - The address credited with mining rewards
    /// * `config` - Difficulty, reward and nonce search parameters
    ///
    /// # Returns
    ///
    /// A new Blockchain instance holding only the genesis block
    pub fn with_config(coinbase_address: Address, config: LedgerConfig) -> Self {
        let genesis_block = Block::genesis();
        info!(
            "Created genesis block {} (difficulty {}, reward {})",
            genesis_block.hash_hex(),
            config.difficulty,
            config.mining_reward
        );

        Blockchain {
            state: Mutex::new(LedgerState {
                chain: vec![genesis_block],
                pending_transactions: Vec::new(),
            }),
            coinbase_address,
            config,
        }
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn coinbase_address(&self) -> &Address {
        &self.coinbase_address
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Block {
        self.state().last_block().clone()
    }

    /// Submits a signed transfer
    ///
    /// # Arguments
    ///
    /// * `sender` - The address the value is taken from
    /// * `recipient` - The address the value is credited to
    /// * `amount` - The amount to transfer
    /// * `sender_public_key` - The key that produced `signature`
    /// * `signature` - The signature over sender, recipient and amount
    ///
    /// # Returns
    ///
    /// true if the transfer was admitted to the pool, false if it was rejected
    pub fn add_transaction(
        &self,
        sender: Address,
        recipient: Address,
        amount: f64,
        sender_public_key: VerifyingKey,
        signature: DigitalSignature,
    ) -> bool {
        let transaction =
            Transaction::new(sender, recipient, amount).with_signature(sender_public_key, signature);

        match self.submit_transaction(transaction) {
            Ok(()) => true,
            Err(err) => {
                warn!("Rejected transaction: {}", err);
                false
            }
        }
    }

    /// Adds a signed transaction to the pending transactions
    ///
    /// The amount must be positive, the signature must verify over the
    /// transaction's economic fields, and the signing key must derive the
    /// declared sender address. Rejected transactions leave the pool untouched.
    ///
    /// # Arguments
    ///
    /// * `transaction` - The transaction, with key and signature attached
    ///
    /// # Returns
    ///
    /// Result with () if the transaction was added, or the rejection reason
    pub fn submit_transaction(&self, transaction: Transaction) -> Result<(), BlockchainError> {
        transaction.validate_amount()?;
        transaction.verify_signature()?;

        debug!(
            "Admitted transfer of {} from {} to {}",
            transaction.amount, transaction.sender, transaction.recipient
        );
        self.state().pending_transactions.push(transaction);

        Ok(())
    }

    /// Mines a new block with the pending transactions and the mining reward
    ///
    /// The pool is cleared only once the block is appended; if no nonce up to
    /// the configured maximum solves the puzzle the ledger is left unchanged.
    ///
    /// # Returns
    ///
    /// Result with the newly mined block
    pub fn mine(&self) -> Result<Block, BlockchainError> {
        let mut state = self.state();

        let mut transactions = state.pending_transactions.clone();
        transactions.push(Transaction::new_coinbase(
            self.coinbase_address.clone(),
            self.config.mining_reward,
        ));

        let previous_hash = state.last_block().hash();
        let template = Block::new(Utc::now(), 0, previous_hash, &transactions);

        let nonce = self
            .proof_of_work(&template)
            .ok_or(BlockchainError::NonceSpaceExhausted {
                difficulty: self.config.difficulty,
                max_nonce: self.config.max_nonce,
            })?;

        let new_block = Block { nonce, ..template };

        state.chain.push(new_block.clone());
        state.pending_transactions.clear();

        info!(
            "Mined block {} with nonce {} ({} transactions)",
            state.chain.len() - 1,
            nonce,
            new_block.transactions.len()
        );

        Ok(new_block)
    }

    /// Searches for a nonce whose block hash meets the difficulty
    ///
    /// The sequential search returns the smallest such nonce; the parallel
    /// one returns whichever nonce a worker finds first.
    fn proof_of_work(&self, template: &Block) -> Option<u64> {
        let difficulty = self.config.difficulty;
        let max_nonce = self.config.max_nonce;

        if self.config.parallel_mining {
            return (0..=max_nonce)
                .into_par_iter()
                .map_init(
                    || template.clone(),
                    |candidate, nonce| {
                        candidate.nonce = nonce;
                        valid_proof(&candidate.hash_hex(), difficulty).then_some(nonce)
                    },
                )
                .find_map_any(|found| found);
        }

        let mut candidate = template.clone();
        (0..=max_nonce).find(|&nonce| {
            candidate.nonce = nonce;
            valid_proof(&candidate.hash_hex(), difficulty)
        })
    }

    /// Gets the entire blockchain
    pub fn chain(&self) -> Vec<Block> {
        self.state().chain.clone()
    }

    /// Gets all pending transactions
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state().pending_transactions.clone()
    }

    /// Computes the net balance of an address by replaying the whole chain
    pub fn balance(&self, address: &Address) -> f64 {
        let state = self.state();
        let mut total = 0.0;

        for block in &state.chain {
            for transaction in &block.transactions {
                if &transaction.recipient == address {
                    total += transaction.amount;
                }
                if &transaction.sender == address {
                    total -= transaction.amount;
                }
            }
        }

        total
    }

    /// Checks genesis shape, hash links and every mined block's proof of work
    pub fn validate(&self) -> Result<(), BlockchainError> {
        let state = self.state();

        let genesis = &state.chain[0];
        if !genesis.is_genesis() || !genesis.transactions.is_empty() {
            return Err(BlockchainError::InvalidChain(
                "Genesis block must have a zero previous hash and no transactions".to_string(),
            ));
        }

        for (index, pair) in state.chain.windows(2).enumerate() {
            let (previous_block, current_block) = (&pair[0], &pair[1]);

            if current_block.previous_hash != previous_block.hash() {
                return Err(BlockchainError::InvalidChain(format!(
                    "Block {} does not link to block {}",
                    index + 1,
                    index
                )));
            }

            if !valid_proof(&current_block.hash_hex(), self.config.difficulty) {
                return Err(BlockchainError::InvalidChain(format!(
                    "Block {} does not meet difficulty {}",
                    index + 1,
                    self.config.difficulty
                )));
            }
        }

        Ok(())
    }

    /// Validates the blockchain
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
