// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Transaction Module
//!
//! A [`Transaction`] is one exam-script lifecycle event: an upload, an
//! evaluation, or a result release. Transactions are carried inside blocks
//! and are never stored on their own.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        : TxKind, derived from the namespaced meta keys
//! builder.rs      : Transaction struct and its fluent builder
//! signing.rs      : optional secondary signature (extra_sig)
//! verification.rs : required-field checks, strict and per-kind
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build**: a workflow assembles the record with [`TransactionBuilder`].
//! 2. **Co-sign** (optional): [`sign_secondary`] attaches `extra_sig`.
//! 3. **Check**: the workflow runs [`validate_script_record`] before it
//!    builds a block; the chain validator later re-checks every stored
//!    transaction with [`validate_transaction`].

pub mod builder;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use signing::{sign_secondary, verify_secondary};
pub use types::TxKind;
pub use verification::{missing_fields, validate_script_record, validate_transaction};
