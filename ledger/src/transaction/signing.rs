// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Secondary transaction signatures.
//!
//! Block headers carry the signature of whoever appended the block. A
//! transaction may additionally carry `extra_sig`: a co-signature, e.g. the
//! examiner vouching for an upload that a service account appends. The
//! signed message is the transaction's canonical bytes with `extra_sig`
//! cleared, so attaching the signature does not invalidate it.

use super::builder::Transaction;
use crate::crypto::keys::{SignerKeypair, SignerPublicKey};
use crate::crypto::signatures::{sign_digest, verify_digest};
use crate::error::LedgerResult;

/// The bytes a secondary signature covers.
fn cosign_bytes(tx: &Transaction) -> Vec<u8> {
    if tx.extra_sig.is_empty() {
        return tx.canonical_bytes();
    }
    let mut unsigned = tx.clone();
    unsigned.extra_sig.clear();
    unsigned.canonical_bytes()
}

/// Attaches a secondary signature, replacing any previous one.
pub fn sign_secondary<'a>(tx: &'a mut Transaction, keypair: &SignerKeypair) -> &'a Transaction {
    let message = cosign_bytes(tx);
    tx.extra_sig = sign_digest(keypair, &message);
    tx
}

/// Verifies `extra_sig` against `public_key`.
///
/// # Errors
///
/// [`crate::LedgerError::Signature`] if the signature is absent or invalid.
pub fn verify_secondary(tx: &Transaction, public_key: &SignerPublicKey) -> LedgerResult<()> {
    verify_digest(public_key, &cosign_bytes(tx), &tx.extra_sig)
}
