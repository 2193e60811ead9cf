//! # Keccak-256 Hashing
//!
//! One-shot and multi-input Keccak-256 helpers. Every identity in the core
//! (header hash, seal hash, transaction hash, dataset seed) is a Keccak-256
//! digest.

use sha3::{Digest, Keccak256};

/// Keccak-256 hash output (256-bit).
pub type Hash256 = [u8; 32];

/// Hash data with Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple inputs as one concatenated message.
pub fn keccak256_concat(inputs: &[&[u8]]) -> Hash256 {
    let mut hasher = Keccak256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_matches_known_vector() {
        // keccak256("") from the original Keccak submission.
        let digest = keccak256(b"");
        assert_eq!(
            hex::encode(digest),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn concat_equals_one_shot() {
        let a = keccak256(b"cinder-chain");
        let b = keccak256_concat(&[b"cinder-", b"chain"]);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_inputs_distinct_digests() {
        assert_ne!(keccak256(b"agree"), keccak256(b"oppose"));
    }
}
