use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codec::{Hash, Hashable, ZERO_HASH};
use super::transaction::Transaction;

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Timestamp when the block was created
    pub timestamp: DateTime<Utc>,

    /// Proof of work (nonce)
    pub nonce: u64,

    /// Hash of the previous block
    #[serde(with = "hex")]
    pub previous_hash: Hash,

    /// Transactions committed by this block
    pub transactions: Vec<Transaction>,
}

impl Hashable for Block {}

impl Block {
    /// Creates a new block, stripping keys and signatures from its transactions
    pub fn new(
        timestamp: DateTime<Utc>,
        nonce: u64,
        previous_hash: Hash,
        transactions: &[Transaction],
    ) -> Self {
        Block {
            timestamp,
            nonce,
            previous_hash,
            transactions: transactions.iter().map(Transaction::committed).collect(),
        }
    }

    /// Creates the genesis block (first block in the chain)
    pub fn genesis() -> Self {
        Block::new(Utc::now(), 0, ZERO_HASH, &[])
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash == ZERO_HASH
    }
}

/// Checks the proof-of-work predicate: `difficulty` leading '0' hex digits
pub fn valid_proof(hash_hex: &str, difficulty: usize) -> bool {
    hash_hex.len() >= difficulty && hash_hex.bytes().take(difficulty).all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::{Address, Wallet};

    #[test]
    fn test_new_block() {
        let transactions = vec![
            Transaction::new_coinbase(Address("recipient1".to_string()), 10.0),
            Transaction::new_coinbase(Address("recipient2".to_string()), 20.0),
        ];

        let block = Block::new(Utc::now(), 100, [7u8; 32], &transactions);

        assert_eq!(block.nonce, 100);
        assert_eq!(block.previous_hash, [7u8; 32]);
        assert_eq!(block.transactions, transactions);
        assert!(!block.is_genesis());
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();

        assert!(genesis.is_genesis());
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.transactions.is_empty());
    }

    #[test]
    fn test_block_drops_signatures() {
        let sender = Wallet::new().unwrap();
        let mut transaction = Transaction::new(
            sender.address().clone(),
            Wallet::new().unwrap().address().clone(),
            4.0,
        );
        transaction.sign(&sender).unwrap();

        let block = Block::new(Utc::now(), 0, ZERO_HASH, &[transaction]);

        assert!(block.transactions[0].signature.is_none());
        assert!(block.transactions[0].sender_public_key.is_none());
    }

    #[test]
    fn test_calculate_hash() {
        let timestamp = Utc::now();
        let transactions = vec![Transaction::new_coinbase(Address("recipient".to_string()), 10.0)];

        let block = Block::new(timestamp, 100, ZERO_HASH, &transactions);
        let same = Block::new(timestamp, 100, ZERO_HASH, &transactions);
        let other_nonce = Block::new(timestamp, 101, ZERO_HASH, &transactions);

        assert_eq!(block.hash_hex().len(), 64);
        assert_eq!(block.hash(), same.hash());
        assert_ne!(block.hash(), other_nonce.hash());
    }

    #[test]
    fn test_encoding_renders_previous_hash_as_hex() {
        let block = Block::new(Utc::now(), 0, [0xab; 32], &[]);
        let encoded = String::from_utf8(block.canonical_bytes()).unwrap();

        assert!(encoded.contains(&format!(r#""previous_hash":"{}""#, "ab".repeat(32))));
    }

    #[test]
    fn test_valid_proof() {
        assert!(valid_proof("000abc", 3));
        assert!(valid_proof("0000bc", 3));
        assert!(!valid_proof("00abcd", 3));
        assert!(valid_proof("abcdef", 0));
        assert!(!valid_proof("00", 3));
    }
}
