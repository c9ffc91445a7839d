// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Backward chain traversal.
//!
//! [`ChainIter`] starts at a hash and follows `prev_hash` links until it
//! reaches the first block. It is a plain [`Iterator`]: a missing block or an
//! empty link ends iteration, and any other failure also ends it but is kept
//! for [`ChainIter::err`]. Callers that care about truncation must check
//! `err()` once the loop is done.
//!
//! A link back to a block already yielded can only come from tampered bytes.
//! The walk stops there with [`LedgerError::ChainIntegrity`] so readers never
//! loop.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::block::Block;
use super::BlockStore;
use crate::error::LedgerError;

/// A block together with the hash it was loaded by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlock {
    pub hash: String,
    pub block: Block,
}

/// Cursor walking from a start hash towards genesis.
pub struct ChainIter<'a> {
    store: &'a dyn BlockStore,
    cursor: String,
    visited: HashSet<String>,
    missing: Option<String>,
    err: Option<LedgerError>,
}

impl<'a> ChainIter<'a> {
    pub fn new(store: &'a dyn BlockStore, start_hash: impl Into<String>) -> Self {
        Self {
            store,
            cursor: start_hash.into(),
            visited: HashSet::new(),
            missing: None,
            err: None,
        }
    }

    /// The error that ended iteration early, if any.
    pub fn err(&self) -> Option<&LedgerError> {
        self.err.as_ref()
    }

    /// Consumes the cursor, returning the captured error.
    pub fn into_err(self) -> Option<LedgerError> {
        self.err
    }

    /// The hash the next call to `next()` will load. Empty once exhausted.
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// The linked hash that had no stored block, if the walk ended on one.
    pub fn missing(&self) -> Option<&str> {
        self.missing.as_deref()
    }
}

impl Iterator for ChainIter<'_> {
    type Item = StoredBlock;

    fn next(&mut self) -> Option<StoredBlock> {
        if self.cursor.is_empty() {
            return None;
        }
        let hash = std::mem::take(&mut self.cursor);
        if self.visited.contains(&hash) {
            warn!(hash = %hash, "chain iterator found a cycle");
            self.err = Some(LedgerError::ChainIntegrity(format!("cycle at {hash}")));
            return None;
        }
        match self.store.get_block(&hash) {
            Ok(block) => {
                debug!(hash = %hash, prev = %block.header.prev_hash, "chain iterator step");
                self.cursor = block.header.prev_hash.clone();
                self.visited.insert(hash.clone());
                Some(StoredBlock { hash, block })
            }
            Err(e) if e.is_not_found() => {
                debug!(hash = %hash, "chain iterator reached a missing block");
                self.missing = Some(hash);
                None
            }
            Err(e) => {
                self.err = Some(e);
                None
            }
        }
    }
}
