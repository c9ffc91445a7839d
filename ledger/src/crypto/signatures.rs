// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Digest Signatures
//!
//! Block headers are signed over `SHA-256(canonical header bytes)` rather
//! than over the raw bytes, so the signed message is always 32 bytes
//! regardless of how long a signer id grows. Both functions here take the
//! *undigested* bytes and hash internally, which keeps callers from ever
//! signing one thing and verifying another.

use super::hash::sha256;
use super::keys::{SignerKeypair, SignerPublicKey};
use crate::error::{LedgerError, LedgerResult};

/// Sign `SHA-256(message)` with `keypair`.
pub fn sign_digest(keypair: &SignerKeypair, message: &[u8]) -> Vec<u8> {
    keypair.sign(&sha256(message))
}

/// Verify a signature produced by [`sign_digest`].
///
/// # Errors
///
/// [`LedgerError::Signature`] when the signature is empty or does not verify.
pub fn verify_digest(
    public_key: &SignerPublicKey,
    message: &[u8],
    signature: &[u8],
) -> LedgerResult<()> {
    if signature.is_empty() {
        return Err(LedgerError::Signature("signature missing".to_string()));
    }
    if !public_key.verify(&sha256(message), signature) {
        return Err(LedgerError::Signature(
            "signature verification failed".to_string(),
        ));
    }
    Ok(())
}
