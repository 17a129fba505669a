use serde::Serialize;
use sha2::{Digest, Sha256};

/// A SHA-256 digest
pub type Hash = [u8; 32];

/// The previous hash carried by the genesis block
pub const ZERO_HASH: Hash = [0u8; 32];

/// Canonical encoding and hashing shared by blocks and transactions
///
/// The encoding is the compact JSON rendering of the `Serialize` derive, so
/// field order follows the struct declaration and never depends on how the
/// value was built.
pub trait Hashable: Serialize {
    /// Returns the canonical byte encoding of the value
    fn canonical_bytes(&self) -> Vec<u8> {
        // Plain structs of strings, numbers and byte arrays always serialize.
        serde_json::to_vec(self).expect("canonical encoding of a ledger value cannot fail")
    }

    /// Returns the SHA-256 digest of the canonical encoding
    fn hash(&self) -> Hash {
        sha256(&self.canonical_bytes())
    }

    /// Returns the digest as a lowercase hexadecimal string
    fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

/// Computes the SHA-256 digest of `data`
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Computes SHA-256 twice, as used for address checksums
pub fn double_sha256(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        value: f64,
    }

    impl Hashable for Sample {}

    #[test]
    fn test_hash_is_deterministic() {
        let a = Sample { name: "alpha".to_string(), value: 1.5 };
        let b = Sample { value: 1.5, name: "alpha".to_string() };

        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash_hex().len(), 64);
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_double_sha256() {
        let once = sha256(b"ledger");
        assert_eq!(double_sha256(b"ledger"), sha256(&once));
    }
}
