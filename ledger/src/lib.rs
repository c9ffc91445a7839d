// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Exam Ledger: Core Library
//!
//! A tamper-evident, append-only ledger for exam-script lifecycle events.
//! Every upload, evaluation and result release is written as a hash-linked,
//! optionally signed block into an embedded sled database. Retroactive edits
//! to any stored block break either its content hash, its merkle root, or its
//! header signature, and the chain validator reports exactly which.
//!
//! ## Architecture
//!
//! - **config**: tree names, well-known keys, and [`LedgerConfig`].
//! - **error**: the [`LedgerError`] taxonomy shared by every module.
//! - **crypto**: SHA-256 helpers and Ed25519 signer keys.
//! - **codec**: canonical JSON, the byte format every digest is taken over.
//! - **transaction**: the event record, its builder, kinds and field checks.
//! - **storage**: [`Block`] hashing and signing, the [`BlockStore`] seam,
//!   sled and in-memory backends, and the backward chain iterator.
//! - **chain**: the [`Chain`] coordinator, the validator, and read queries.
//!
//! ## Data Flow
//!
//! ```text
//! workflow → Transaction → Block (prev_hash = head) → Chain::append_block
//!                                                        │
//!                                            block_hash  ▼
//!                                   BlockStore::commit_block ── blocks / chain_meta
//! ```
//!
//! Queries and validation read back through the same store, so whatever the
//! writer persisted is exactly what a verifier sees.

pub mod chain;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;
pub mod transaction;

pub use chain::{
    validate_chain, Chain, ChainCursor, ChainStats, KeyRing, LedgerEvent, SignerKeyResolver,
    ValidationReport,
};
pub use config::LedgerConfig;
pub use crypto::{SignerKeypair, SignerPublicKey};
pub use error::{LedgerError, LedgerResult};
pub use storage::{
    block_hash, compute_merkle_root, Block, BlockHeader, BlockStore, ChainIter,
    InMemoryBlockStore, SledBlockStore, StoredBlock,
};
pub use transaction::{Transaction, TransactionBuilder, TxKind};
