// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Signer Keys
//!
//! Ed25519 keypairs for the identities that sign blocks: examiners,
//! evaluators, and the releasing authority. A signer is known to the rest of
//! the system by a free-form `signer_id`; the mapping from that id to a
//! public key is owned by whoever validates the chain (see
//! [`crate::chain::SignerKeyResolver`]).
//!
//! Key bytes are never logged. The `Debug` impl of [`SignerKeypair`] prints
//! only the public half.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// A signer's Ed25519 keypair.
///
/// Does not implement `Serialize`: exporting a secret key should be an
/// explicit call to [`SignerKeypair::secret_key_hex`].
pub struct SignerKeypair {
    signing_key: SigningKey,
}

/// The public half of a signer identity.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignerPublicKey {
    bytes: [u8; 32],
}

// ---------------------------------------------------------------------------
// SignerKeypair
// ---------------------------------------------------------------------------

impl SignerKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. Handy for fixtures.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Load a keypair from a hex-encoded 32-byte secret key, as written by
    /// `exam-ledger-node init`. Surrounding whitespace is ignored.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&arr))
    }

    /// The public key that verifies this keypair's signatures.
    pub fn public_key(&self) -> SignerPublicKey {
        SignerPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign `message`, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Export the secret key as hex. Handle with care.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

impl Clone for SignerKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for SignerKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignerKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// SignerPublicKey
// ---------------------------------------------------------------------------

impl SignerPublicKey {
    /// Parse raw bytes, rejecting values that are not valid curve points.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parse a hex-encoded public key. Surrounding whitespace is ignored.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }

    /// Raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Hex-encoded representation (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// `true` iff `signature` is a valid Ed25519 signature over `message`.
    ///
    /// Uses strict verification; wrong-length signatures simply fail.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Ok(sig) = Signature::from_slice(signature) else {
            return false;
        };
        verifying_key.verify_strict(message, &sig).is_ok()
    }
}

impl fmt::Debug for SignerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignerPublicKey({})", self.to_hex())
    }
}
