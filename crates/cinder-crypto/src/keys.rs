//! # Witness Keys (ed25519)
//!
//! Keypair, public key, and signature newtypes for DPoS witnesses. The
//! byte-oriented API keeps curve types out of the consensus crates: pools and
//! engines only ever see `[u8; 32]` keys and `[u8; 64]` signatures.

use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// Witness public key (32 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WitnessPublicKey([u8; 32]);

impl WitnessPublicKey {
    /// Create from raw bytes, validating the curve point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify a signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &WitnessSignature) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Witness signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WitnessSignature([u8; 64]);

impl WitnessSignature {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl std::fmt::Debug for WitnessSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WitnessSignature(0x")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

impl Default for WitnessSignature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

/// ed25519 witness keypair.
pub struct WitnessKeypair {
    signing_key: SigningKey,
}

impl WitnessKeypair {
    /// Generate a random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed. Deterministic, used by test fixtures and
    /// by nodes loading a stored witness key.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> WitnessPublicKey {
        WitnessPublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message (deterministic per RFC 8032).
    pub fn sign(&self, message: &[u8]) -> WitnessSignature {
        let sig = self.signing_key.sign(message);
        WitnessSignature(sig.to_bytes())
    }
}
