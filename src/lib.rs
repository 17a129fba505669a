//! A minimal in-memory ledger: P-256 key pairs with Base58Check addresses,
//! ECDSA-signed transfers and proof-of-work mining.

pub mod blockchain;

pub use blockchain::{
    Address, Block, Blockchain, BlockchainError, DigitalSignature, Hashable, LedgerConfig,
    Transaction, Wallet,
};
