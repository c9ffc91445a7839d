// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Chain Module
//!
//! The coordination layer on top of a [`crate::storage::BlockStore`].
//!
//! ```text
//! coordinator.rs : Chain, the single-writer/multi-reader append path
//! validate.rs    : head-to-genesis integrity and signature validation
//! query.rs       : script lookups, history, releases and stats
//! ```
//!
//! There is no global chain handle. Open a store, wrap it in a [`Chain`]
//! once, and hand out `Arc<Chain>` to whoever needs it.

pub mod coordinator;
pub mod query;
pub mod validate;

pub use coordinator::{Chain, ChainCursor};
pub use query::{ChainStats, LedgerEvent};
pub use validate::{validate_chain, KeyRing, SignerKeyResolver, ValidationReport};
