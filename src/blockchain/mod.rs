// Blockchain module
//
// This module contains the core ledger implementation including:
// - Canonical encoding and hashing
// - Key pairs and address derivation
// - Transaction signing and verification
// - Block structure
// - Blockchain structure and proof of work

pub mod block;
pub mod chain;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, BlockchainError};
pub use codec::{Hash, Hashable};
pub use config::LedgerConfig;
pub use crypto::{Address, DigitalSignature, Wallet};
pub use transaction::{Transaction, TransactionError};
