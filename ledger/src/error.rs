// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Error types for the ledger.
//!
//! Every fallible ledger operation returns a [`LedgerError`]. The variants
//! mirror the failure classes a caller has to distinguish: storage faults are
//! fatal to the operation, `NotFound` is an ordinary miss, and the remaining
//! three describe what is wrong with the chain's contents.

use thiserror::Error;

/// Errors produced by the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The embedded engine failed, a tree is missing, or stored bytes could
    /// not be encoded/decoded. `op` names the ledger operation that failed.
    #[error("storage error during {op}: {reason}")]
    Storage {
        /// Ledger operation in progress (`put_block`, `set_head`, ...).
        op: &'static str,
        /// Underlying cause, rendered.
        reason: String,
    },

    /// A block hash or head pointer is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A transaction is malformed or misses a required field.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A signature is missing, malformed, or does not verify, or the signer
    /// has no known public key.
    #[error("signature error: {0}")]
    Signature(String),

    /// The chain's linkage or content addressing is broken.
    #[error("chain integrity violated: {0}")]
    ChainIntegrity(String),
}

impl LedgerError {
    /// Wraps an engine-level failure with the operation it interrupted.
    pub fn storage(op: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Storage {
            op,
            reason: reason.to_string(),
        }
    }

    /// `true` for misses, which an HTTP boundary reports as 404 rather
    /// than a server fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias used throughout the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;
