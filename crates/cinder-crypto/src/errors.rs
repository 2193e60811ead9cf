//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors raised by key handling and signature verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Public key bytes do not decode to a valid curve point.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Private key material is malformed.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Signature bytes are malformed.
    #[error("invalid signature encoding")]
    InvalidSignature,

    /// Signature does not verify under the given public key.
    #[error("signature verification failed")]
    SignatureVerificationFailed,
}
