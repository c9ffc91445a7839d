// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Block Structure
//!
//! A block is the unit of append. It carries an ordered list of exam-script
//! transactions, a link to the previous block (forming the chain), and an
//! optional signature by the appending identity.
//!
//! ## Block Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  BlockHeader                                │
//! │  ├── prev_hash: String    (hex, "" = first) │
//! │  ├── timestamp: i64       (unix seconds)    │
//! │  ├── merkle_root: String  (hex digest)      │
//! │  ├── signer_id: String                      │
//! │  └── signature: Vec<u8>   (Ed25519)         │
//! ├─────────────────────────────────────────────┤
//! │  transactions: Vec<Transaction>             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The canonical header bytes are the compact JSON of `prev_hash`,
//! `timestamp`, `merkle_root` and `signer_id`, in that order. The signature
//! is over SHA-256 of those bytes. The block hash is SHA-256 of the header
//! bytes followed by the JSON of the transaction list, so it covers the
//! content but not the signature.
//!
//! ## Merkle Root
//!
//! Not a binary tree. The root is SHA-256 over the concatenated SHA-256
//! digests of each transaction, in list order, and SHA-256 of the empty
//! string for an empty list. It detects that the list changed, not which
//! element did, and supports no inclusion proofs.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::codec::{self, base64_bytes, null_as_default};
use crate::crypto::hash::{sha256, sha256_concat, sha256_hex};
use crate::crypto::keys::{SignerKeypair, SignerPublicKey};
use crate::crypto::signatures::{sign_digest, verify_digest};
use crate::error::{LedgerError, LedgerResult};
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// BlockHeader
// ---------------------------------------------------------------------------

/// Block metadata and chain linkage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hex hash of the preceding block. Empty for the first block.
    #[serde(default)]
    pub prev_hash: String,
    /// Unix timestamp (seconds) when the block was built.
    #[serde(default)]
    pub timestamp: i64,
    /// Hex digest over the transaction list, see [`compute_merkle_root`].
    #[serde(default)]
    pub merkle_root: String,
    /// Identity whose key signed this header.
    #[serde(default)]
    pub signer_id: String,
    /// Signature over SHA-256 of [`BlockHeader::canonical_bytes`].
    #[serde(default, with = "base64_bytes")]
    pub signature: Vec<u8>,
}

/// The signed subset of [`BlockHeader`], borrowed for serialization.
#[derive(Serialize)]
struct UnsignedHeader<'a> {
    prev_hash: &'a str,
    timestamp: i64,
    merkle_root: &'a str,
    signer_id: &'a str,
}

impl BlockHeader {
    /// Canonical header bytes: everything except the signature.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let unsigned = UnsignedHeader {
            prev_hash: &self.prev_hash,
            timestamp: self.timestamp,
            merkle_root: &self.merkle_root,
            signer_id: &self.signer_id,
        };
        codec::to_vec(&unsigned).unwrap_or_default()
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A full ledger block: header plus ordered transactions.
///
/// The hash is not stored inside the block; it is the key the block is
/// stored under. Call [`Block::hash`] to compute it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Build an unsigned block stamped with the current time.
    pub fn new(
        prev_hash: impl Into<String>,
        transactions: Vec<Transaction>,
        signer_id: impl Into<String>,
    ) -> Self {
        Self::new_at(prev_hash, transactions, signer_id, Utc::now().timestamp())
    }

    /// Like [`Block::new`] with an explicit timestamp, for reproducible hashes.
    pub fn new_at(
        prev_hash: impl Into<String>,
        transactions: Vec<Transaction>,
        signer_id: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        let merkle_root = compute_merkle_root(&transactions);
        Self {
            header: BlockHeader {
                prev_hash: prev_hash.into(),
                timestamp,
                merkle_root,
                signer_id: signer_id.into(),
                signature: Vec::new(),
            },
            transactions,
        }
    }

    /// `true` for the first block of a chain.
    pub fn is_genesis(&self) -> bool {
        self.header.prev_hash.is_empty()
    }

    /// Canonical header bytes, see [`BlockHeader::canonical_bytes`].
    pub fn header_bytes(&self) -> Vec<u8> {
        self.header.canonical_bytes()
    }

    /// JSON of the transaction list as it enters the block hash.
    pub fn transactions_bytes(&self) -> Vec<u8> {
        codec::to_vec(&self.transactions).unwrap_or_default()
    }

    /// The block's content hash (hex). Pure: identical content, identical hash.
    pub fn hash(&self) -> String {
        block_hash(self)
    }

    /// Sign the header with `keypair`, replacing any previous signature.
    pub fn sign(&mut self, keypair: &SignerKeypair) {
        self.header.signature = sign_digest(keypair, &self.header_bytes());
    }

    /// Check the header signature against `public_key`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Signature`] if the signature is absent or does not
    /// verify.
    pub fn verify_signature(&self, public_key: &SignerPublicKey) -> LedgerResult<()> {
        verify_digest(public_key, &self.header_bytes(), &self.header.signature)
    }

    /// Recompute the merkle root and compare it with the stored one.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ChainIntegrity`] on mismatch.
    pub fn verify_merkle_root(&self) -> LedgerResult<()> {
        let computed = compute_merkle_root(&self.transactions);
        if computed == self.header.merkle_root {
            Ok(())
        } else {
            Err(LedgerError::ChainIntegrity(format!(
                "merkle root mismatch: header has {}, transactions give {}",
                self.header.merkle_root, computed
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

/// Simplified merkle root over `transactions`, hex-encoded.
pub fn compute_merkle_root(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return sha256_hex(&[]);
    }
    let mut leaves = Vec::with_capacity(transactions.len() * 32);
    for tx in transactions {
        leaves.extend_from_slice(&tx.leaf_hash());
    }
    hex::encode(sha256(&leaves))
}

/// Content hash of `block`: hex SHA-256 of header bytes ++ transaction bytes.
pub fn block_hash(block: &Block) -> String {
    let header = block.header_bytes();
    let transactions = block.transactions_bytes();
    hex::encode(sha256_concat(&[header.as_slice(), transactions.as_slice()]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
