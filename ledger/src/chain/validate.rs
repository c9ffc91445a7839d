// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Chain Validation
//!
//! Walks the chain from head to genesis and proves, block by block, that
//! nothing was altered after it was appended.
//!
//! ## Checks (per block, in order)
//!
//! ```text
//! 1. ADDRESS    recomputed content hash == the key the block was loaded by
//! 2. MERKLE     recomputed merkle root == header.merkle_root
//! 3. SIGNATURE  header signature verifies under the signer's public key
//! 4. CONTENT    every transaction passes validate_transaction
//! ```
//!
//! After the walk the last block must be a genesis block (empty
//! `prev_hash`); a link that points at a missing block breaks the chain.
//!
//! Public keys come from a caller-supplied [`SignerKeyResolver`], so the
//! ledger never needs to know where identities live.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::coordinator::Chain;
use crate::crypto::keys::SignerPublicKey;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::BlockStore;
use crate::transaction::validate_transaction;

// ---------------------------------------------------------------------------
// Key resolution
// ---------------------------------------------------------------------------

/// Maps a `signer_id` to the public key its blocks must verify under.
pub trait SignerKeyResolver {
    fn resolve(&self, signer_id: &str) -> Option<SignerPublicKey>;
}

impl<F> SignerKeyResolver for F
where
    F: Fn(&str) -> Option<SignerPublicKey>,
{
    fn resolve(&self, signer_id: &str) -> Option<SignerPublicKey> {
        self(signer_id)
    }
}

/// A fixed set of known signers.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: HashMap<String, SignerPublicKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` for `signer_id`, replacing any earlier key.
    pub fn insert(&mut self, signer_id: impl Into<String>, key: SignerPublicKey) {
        self.keys.insert(signer_id.into(), key);
    }

    /// Builder form of [`KeyRing::insert`].
    pub fn with(mut self, signer_id: impl Into<String>, key: SignerPublicKey) -> Self {
        self.insert(signer_id, key);
        self
    }

    pub fn get(&self, signer_id: &str) -> Option<&SignerPublicKey> {
        self.keys.get(signer_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Known signer ids, sorted.
    pub fn signers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl SignerKeyResolver for KeyRing {
    fn resolve(&self, signer_id: &str) -> Option<SignerPublicKey> {
        self.keys.get(signer_id).cloned()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of a successful [`validate_chain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Head hash at the time of validation. Empty for an empty chain.
    pub head: String,
    /// `true` when there was nothing to validate.
    pub empty: bool,
    pub blocks_checked: usize,
    pub transactions_checked: usize,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the whole chain reachable from the current head.
///
/// Holds the chain's read lock for the duration, so appends wait.
///
/// # Errors
///
/// - [`LedgerError::ChainIntegrity`]: hash, merkle root or linkage broken.
/// - [`LedgerError::Signature`]: unknown signer or bad signature.
/// - [`LedgerError::Validation`]: a transaction is missing required fields.
/// - [`LedgerError::Storage`]: the walk hit an I/O or decode failure.
pub fn validate_chain<S, R>(chain: &Chain<S>, resolver: &R) -> LedgerResult<ValidationReport>
where
    S: BlockStore,
    R: SignerKeyResolver + ?Sized,
{
    let mut cursor = chain.iter_from_head()?;
    let mut report = ValidationReport::default();
    let mut last_prev: Option<String> = None;

    for stored in cursor.by_ref() {
        if report.blocks_checked == 0 {
            report.head = stored.hash.clone();
        }
        let block = &stored.block;

        let recomputed = block.hash();
        if recomputed != stored.hash {
            warn!(stored = %stored.hash, recomputed = %recomputed, "block content does not match its key");
            return Err(LedgerError::ChainIntegrity(format!(
                "block {} hashes to {}",
                stored.hash, recomputed
            )));
        }
        block.verify_merkle_root()?;

        let signer = &block.header.signer_id;
        let key = resolver.resolve(signer).ok_or_else(|| {
            LedgerError::Signature(format!(
                "no public key for signer '{}' (block {})",
                signer, stored.hash
            ))
        })?;
        block.verify_signature(&key).map_err(|e| {
            warn!(hash = %stored.hash, signer = %signer, "block signature rejected");
            LedgerError::Signature(format!("block {}: {}", stored.hash, e))
        })?;

        for (i, tx) in block.transactions.iter().enumerate() {
            validate_transaction(tx).map_err(|e| {
                LedgerError::Validation(format!("block {} transaction {}: {}", stored.hash, i, e))
            })?;
        }

        debug!(hash = %stored.hash, txs = block.transactions.len(), "block validated");
        report.blocks_checked += 1;
        report.transactions_checked += block.transactions.len();
        last_prev = Some(block.header.prev_hash.clone());
    }

    let missing = cursor.missing().map(str::to_owned);
    if let Some(e) = cursor.into_err() {
        return Err(e);
    }
    if let Some(missing) = missing {
        return Err(LedgerError::ChainIntegrity(match last_prev {
            None => format!("head {missing} has no stored block"),
            Some(_) => format!("chain broken: block {missing} is missing"),
        }));
    }

    report.empty = report.blocks_checked == 0;
    info!(
        head = %report.head,
        blocks = report.blocks_checked,
        txs = report.transactions_checked,
        "chain validated"
    );
    Ok(report)
}

impl<S: BlockStore> Chain<S> {
    /// Method form of [`validate_chain`].
    pub fn validate<R>(&self, resolver: &R) -> LedgerResult<ValidationReport>
    where
        R: SignerKeyResolver + ?Sized,
    {
        validate_chain(self, resolver)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::SignerKeypair;
    use crate::storage::block::Block;
    use crate::storage::mem::InMemoryBlockStore;
    use crate::transaction::{Transaction, TransactionBuilder};

    fn tx(id: &str) -> Transaction {
        TransactionBuilder::new(id)
            .usn("1RV21CS001")
            .course("CS101", "5")
            .cid(format!("bafy-{id}"))
            .created_at(1)
            .build()
    }

    fn signed_chain(n: usize) -> (Chain<InMemoryBlockStore>, SignerKeypair, KeyRing) {
        let chain = Chain::new(InMemoryBlockStore::new());
        let kp = SignerKeypair::generate();
        for i in 0..n {
            chain
                .append_transactions(vec![tx(&format!("s{i}"))], "examiner", Some(&kp))
                .unwrap();
        }
        let ring = KeyRing::new().with("examiner", kp.public_key());
        (chain, kp, ring)
    }

    /// Store an edited copy of the head block under its recomputed hash and
    /// point the head at it.
    fn replace_head(chain: &Chain<InMemoryBlockStore>, edit: impl FnOnce(&mut Block)) {
        let head = chain.head().unwrap();
        let mut block = chain.get_block(&head).unwrap();
        edit(&mut block);
        let hash = block.hash();
        chain.store().commit_block(&hash, &block).unwrap();
    }

    /// Rewrite the head block's bytes in place under its original key, as a
    /// tamperer with direct disk access would.
    fn overwrite_head(chain: &Chain<InMemoryBlockStore>, edit: impl FnOnce(&mut Block)) {
        let head = chain.head().unwrap();
        let mut block = chain.get_block(&head).unwrap();
        edit(&mut block);
        chain
            .store()
            .insert_raw(head, crate::codec::to_vec(&block).unwrap());
    }

    #[test]
    fn empty_chain_is_valid() {
        let chain = Chain::new(InMemoryBlockStore::new());
        let report = validate_chain(&chain, &KeyRing::new()).unwrap();
        assert!(report.empty);
        assert_eq!(report.head, "");
        assert_eq!(report.blocks_checked, 0);
    }

    #[test]
    fn signed_chain_validates() {
        let (chain, _, ring) = signed_chain(5);
        let report = chain.validate(&ring).unwrap();
        assert!(!report.empty);
        assert_eq!(report.blocks_checked, 5);
        assert_eq!(report.transactions_checked, 5);
        assert_eq!(report.head, chain.head().unwrap());
    }

    #[test]
    fn closure_resolver_works() {
        let (chain, kp, _) = signed_chain(2);
        let pk = kp.public_key();
        let resolver = move |id: &str| (id == "examiner").then(|| pk.clone());
        assert!(validate_chain(&chain, &resolver).is_ok());
    }

    #[test]
    fn unknown_signer_is_a_signature_error() {
        let (chain, _, _) = signed_chain(1);
        let err = validate_chain(&chain, &KeyRing::new()).unwrap_err();
        assert!(matches!(err, LedgerError::Signature(_)));
    }

    #[test]
    fn corrupted_signature_is_detected() {
        let (chain, _, ring) = signed_chain(3);
        overwrite_head(&chain, |b| b.header.signature[0] ^= 0xff);
        let err = chain.validate(&ring).unwrap_err();
        assert!(matches!(err, LedgerError::Signature(_)), "got {err:?}");
    }

    #[test]
    fn wrong_key_is_detected() {
        let (chain, _, _) = signed_chain(2);
        let ring = KeyRing::new().with("examiner", SignerKeypair::generate().public_key());
        assert!(matches!(
            chain.validate(&ring),
            Err(LedgerError::Signature(_))
        ));
    }

    #[test]
    fn unsigned_block_fails() {
        let (chain, _, ring) = signed_chain(1);
        chain.append_transactions(vec![tx("x")], "examiner", None).unwrap();
        assert!(matches!(chain.validate(&ring), Err(LedgerError::Signature(_))));
    }

    #[test]
    fn bytes_not_matching_key_break_integrity() {
        let (chain, _, ring) = signed_chain(2);
        overwrite_head(&chain, |b| b.transactions[0].usn = "1RV21CS999".into());
        let err = chain.validate(&ring).unwrap_err();
        assert!(matches!(err, LedgerError::ChainIntegrity(_)), "got {err:?}");
    }

    #[test]
    fn merkle_mismatch_breaks_integrity() {
        let (chain, _, ring) = signed_chain(1);
        replace_head(&chain, |b| {
            b.transactions.push(tx("smuggled"));
        });
        let err = chain.validate(&ring).unwrap_err();
        assert!(matches!(err, LedgerError::ChainIntegrity(_)));
    }

    #[test]
    fn malformed_transaction_is_a_validation_error() {
        let chain = Chain::new(InMemoryBlockStore::new());
        let kp = SignerKeypair::generate();
        let mut bad = tx("s1");
        bad.cid.clear();
        chain.append_transactions(vec![bad], "examiner", Some(&kp)).unwrap();
        let ring = KeyRing::new().with("examiner", kp.public_key());
        assert!(matches!(chain.validate(&ring), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn missing_link_breaks_integrity() {
        let chain = Chain::new(InMemoryBlockStore::new());
        let kp = SignerKeypair::generate();
        let mut orphan = Block::new_at("f".repeat(64), vec![tx("a")], "examiner", 1);
        orphan.sign(&kp);
        chain.append_block(&orphan).unwrap();
        let ring = KeyRing::new().with("examiner", kp.public_key());
        let err = chain.validate(&ring).unwrap_err();
        assert!(err.to_string().contains("is missing"), "got {err}");
    }

    #[test]
    fn dangling_head_breaks_integrity() {
        let chain = Chain::new(InMemoryBlockStore::new());
        chain.store().set_head("abc").unwrap();
        let err = validate_chain(&chain, &KeyRing::new()).unwrap_err();
        assert!(matches!(err, LedgerError::ChainIntegrity(_)));
    }

    #[test]
    fn key_ring_accessors() {
        let a = SignerKeypair::generate().public_key();
        let ring = KeyRing::new().with("b", a.clone()).with("a", a.clone());
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.signers(), vec!["a", "b"]);
        assert_eq!(ring.get("a"), Some(&a));
        assert!(ring.resolve("zzz").is_none());
    }
}
