use p256::ecdsa::signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use rand::rngs::OsRng;
use rand::RngCore;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::Digest;
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

use super::codec::{double_sha256, sha256, Hash};

/// Version byte prepended to the hash160 of a public key
pub const ADDRESS_VERSION: u8 = 0x00;

/// Length of the decoded address payload: version, hash160 and checksum
pub const ADDRESS_PAYLOAD_LEN: usize = 25;

const CHECKSUM_LEN: usize = 4;
const SCALAR_LEN: usize = 32;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Failed to sign message: {0}")]
    SigningError(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Represents a wallet address (Base58Check of the public key's hash160)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Derives the address of a public key
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        derive_address(public_key)
    }

    /// The sender used by mining reward transactions
    ///
    /// `0` is outside the Base58 alphabet, so no derived address can equal it.
    pub fn system() -> Self {
        Address("0".to_string())
    }

    /// Checks the Base58 payload: length, version byte and checksum
    pub fn is_well_formed(&self) -> bool {
        let payload = match bs58::decode(&self.0).into_vec() {
            Ok(payload) => payload,
            Err(_) => return false,
        };

        if payload.len() != ADDRESS_PAYLOAD_LEN || payload[0] != ADDRESS_VERSION {
            return false;
        }

        let (versioned, checksum) = payload.split_at(ADDRESS_PAYLOAD_LEN - CHECKSUM_LEN);
        double_sha256(versioned)[..CHECKSUM_LEN] == *checksum
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Address(s.to_string());
        if !address.is_well_formed() {
            return Err(CryptoError::DecodingError(format!(
                "Not a valid address: {}",
                s
            )));
        }

        Ok(address)
    }
}

/// Returns the raw public key bytes: X then Y, 32 bytes each, big-endian
pub fn raw_public_key(public_key: &VerifyingKey) -> Vec<u8> {
    let point = PublicKey::from(public_key).to_encoded_point(false);
    // Uncompressed SEC1 points are 0x04 followed by X and Y.
    point.as_bytes()[1..].to_vec()
}

/// Derives the address of a public key
///
/// SHA-256 then RIPEMD-160 over the raw key, prefixed with the version byte,
/// followed by the first four bytes of the double SHA-256 of that prefix,
/// all Base58 encoded.
pub fn derive_address(public_key: &VerifyingKey) -> Address {
    let digest: Hash = sha256(&raw_public_key(public_key));
    let hash160 = Ripemd160::digest(digest);

    let mut payload = Vec::with_capacity(ADDRESS_PAYLOAD_LEN);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(&hash160);

    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    Address(bs58::encode(payload).into_string())
}

/// Represents an ECDSA signature as its (r, s) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignature {
    #[serde(with = "hex")]
    pub r: [u8; 32],

    #[serde(with = "hex")]
    pub s: [u8; 32],
}

impl DigitalSignature {
    /// Creates a new digital signature from a signature
    pub fn from_signature(signature: &Signature) -> Self {
        let (r_bytes, s_bytes) = signature.split_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&r_bytes);
        s.copy_from_slice(&s_bytes);

        DigitalSignature { r, s }
    }

    /// Converts the digital signature to a signature
    ///
    /// Fails when either scalar is zero or not below the curve order.
    pub fn to_signature(&self) -> Result<Signature, CryptoError> {
        Signature::from_scalars(self.r, self.s)
            .map_err(|e| CryptoError::DecodingError(e.to_string()))
    }
}

impl fmt::Display for DigitalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", hex::encode(self.r), hex::encode(self.s))
    }
}

/// Represents a wallet with a keypair
#[derive(Debug, Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

impl Wallet {
    /// Creates a new wallet with a random keypair
    pub fn new() -> Result<Self, CryptoError> {
        let mut csprng = OsRng;
        let mut secret = [0u8; SCALAR_LEN];

        // Zero or out-of-range draws are rejected by the curve; draw again.
        loop {
            csprng
                .try_fill_bytes(&mut secret)
                .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;

            if let Ok(signing_key) = SigningKey::from_slice(&secret) {
                return Ok(Self::from_signing_key(signing_key));
            }
        }
    }

    /// Creates a wallet from an existing secret key
    pub fn from_secret_key(secret_key_bytes: &[u8]) -> Result<Self, CryptoError> {
        if secret_key_bytes.len() != SCALAR_LEN {
            return Err(CryptoError::InvalidPrivateKey(format!(
                "Private key must be {} bytes, got {}",
                SCALAR_LEN,
                secret_key_bytes.len()
            )));
        }

        let signing_key = SigningKey::from_slice(secret_key_bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;

        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = derive_address(&verifying_key);

        Wallet {
            signing_key,
            verifying_key,
            address,
        }
    }

    /// Gets the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Gets the wallet's public key
    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Gets the wallet's private key. Custody is the caller's responsibility.
    pub fn private_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(raw_public_key(&self.verifying_key))
    }

    /// Signs a 32-byte digest with the wallet's private key
    pub fn sign_digest(&self, digest: &Hash) -> Result<DigitalSignature, CryptoError> {
        sign_digest(&self.signing_key, digest)
    }
}

/// Signs a 32-byte digest with a fresh random nonce
pub fn sign_digest(private_key: &SigningKey, digest: &Hash) -> Result<DigitalSignature, CryptoError> {
    let signature: Signature = private_key
        .sign_prehash_with_rng(&mut OsRng, digest)
        .map_err(|e| CryptoError::SigningError(e.to_string()))?;

    Ok(DigitalSignature::from_signature(&signature))
}

/// Verifies a signature against a digest and public key
pub fn verify_signature(
    digest: &Hash,
    signature: &DigitalSignature,
    public_key: &VerifyingKey,
) -> Result<bool, CryptoError> {
    let signature = signature.to_signature()?;

    match public_key.verify_prehash(digest, &signature) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}
