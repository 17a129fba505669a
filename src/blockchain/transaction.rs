use p256::ecdsa::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::Hashable;
use super::crypto::{self, derive_address, Address, CryptoError, DigitalSignature, Wallet};

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Sender address {declared} does not belong to the signing key ({derived})")]
    AddressMismatch { declared: Address, derived: Address },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Transaction already signed")]
    AlreadySigned,

    #[error("Transaction not signed")]
    NotSigned,

    #[error("Crypto error: {0}")]
    CryptoError(#[from] CryptoError),
}

/// Checks that an amount is a finite, strictly positive number
pub fn validate_amount(amount: f64) -> Result<(), TransactionError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TransactionError::InvalidAmount(format!(
            "Amount must be positive: {}",
            amount
        )));
    }

    Ok(())
}

/// Represents a value transfer between two addresses
///
/// Only the sender, recipient and amount are part of the canonical encoding;
/// the key and signature travel with a pending transaction but are never
/// hashed, signed over or committed into a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address
    pub sender: Address,

    /// Recipient's address
    pub recipient: Address,

    /// Amount being transferred
    pub amount: f64,

    /// Public key of the signer, set once signed
    #[serde(skip)]
    pub sender_public_key: Option<VerifyingKey>,

    /// Digital signature over the economic fields
    #[serde(skip)]
    pub signature: Option<DigitalSignature>,
}

impl Hashable for Transaction {}

impl Transaction {
    /// Creates a new unsigned transaction
    pub fn new(sender: Address, recipient: Address, amount: f64) -> Self {
        Transaction {
            sender,
            recipient,
            amount,
            sender_public_key: None,
            signature: None,
        }
    }

    /// Creates a new coinbase transaction (mining reward)
    pub fn new_coinbase(recipient: Address, amount: f64) -> Self {
        Transaction::new(Address::system(), recipient, amount)
    }

    /// Attaches an externally produced key and signature
    pub fn with_signature(mut self, public_key: VerifyingKey, signature: DigitalSignature) -> Self {
        self.sender_public_key = Some(public_key);
        self.signature = Some(signature);
        self
    }

    /// Checks if the transaction is a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        self.sender == Address::system()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Signs the economic fields with a private key
    ///
    /// Every call draws a fresh nonce, so signing the same transaction twice
    /// yields two different, equally valid signatures.
    pub fn sign_with_key(&self, private_key: &SigningKey) -> Result<DigitalSignature, TransactionError> {
        Ok(crypto::sign_digest(private_key, &self.hash())?)
    }

    /// Signs the transaction with a wallet and attaches key and signature
    pub fn sign(&mut self, wallet: &Wallet) -> Result<DigitalSignature, TransactionError> {
        if self.signature.is_some() {
            return Err(TransactionError::AlreadySigned);
        }

        if wallet.address() != &self.sender {
            return Err(TransactionError::AddressMismatch {
                declared: self.sender.clone(),
                derived: wallet.address().clone(),
            });
        }

        let signature = wallet.sign_digest(&self.hash())?;

        self.sender_public_key = Some(wallet.public_key().clone());
        self.signature = Some(signature.clone());

        Ok(signature)
    }

    /// Checks a signature over the economic fields against a public key
    pub fn verify(&self, public_key: &VerifyingKey, signature: &DigitalSignature) -> bool {
        crypto::verify_signature(&self.hash(), signature, public_key).unwrap_or(false)
    }

    /// Verifies the attached signature and that the signer owns the sender address
    pub fn verify_signature(&self) -> Result<(), TransactionError> {
        let (public_key, signature) = match (&self.sender_public_key, &self.signature) {
            (Some(public_key), Some(signature)) => (public_key, signature),
            _ => return Err(TransactionError::NotSigned),
        };

        if !self.verify(public_key, signature) {
            return Err(TransactionError::InvalidSignature);
        }

        let derived = derive_address(public_key);
        if derived != self.sender {
            return Err(TransactionError::AddressMismatch {
                declared: self.sender.clone(),
                derived,
            });
        }

        Ok(())
    }

    /// Checks that the amount is a finite, strictly positive number
    pub fn validate_amount(&self) -> Result<(), TransactionError> {
        validate_amount(self.amount)
    }

    /// Returns the record committed into a block, without key or signature
    pub fn committed(&self) -> Transaction {
        Transaction::new(self.sender.clone(), self.recipient.clone(), self.amount)
    }
}
