// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Chain Coordinator
//!
//! [`Chain`] is the only way callers mutate the ledger. It owns a block
//! store and one reader/writer lock:
//!
//! ```text
//! append_block / append_transactions   → write lock
//! get_block / head / for_each_block    → read lock
//! iter / iter_from_head                → read lock, held by the cursor
//! ```
//!
//! Appends are therefore serialized, reads run concurrently with each other,
//! and no read ever observes a block that is stored but not yet the head.
//!
//! ## Append Pipeline
//!
//! ```text
//! 1. HASH    compute the content hash of the block
//! 2. STORE   persist it under that hash (no overwrite)
//! 3. ADVANCE point the head at it
//! ```
//!
//! Steps 2 and 3 go through [`BlockStore::commit_block`]. On a two-phase
//! store a failure at step 3 leaves the block durable but unreferenced and
//! the previous head in place. The error is returned and nothing is undone.
//!
//! `append_block` does not check `prev_hash` against the current head. Use
//! [`Chain::append_transactions`] to have the link filled in under the lock.

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::crypto::keys::SignerKeypair;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::block::{block_hash, Block};
use crate::storage::iter::{ChainIter, StoredBlock};
use crate::storage::{BlockStore, SledBlockStore};
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Append-only ledger over a [`BlockStore`].
///
/// Construct one per database and share it as `Arc<Chain>`.
pub struct Chain<S = SledBlockStore> {
    store: S,
    lock: RwLock<()>,
}

impl<S: BlockStore> Chain<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            lock: RwLock::new(()),
        }
    }

    /// The underlying store. Bypasses the chain lock.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist `block` and make it the head. Returns the block's hash.
    pub fn append_block(&self, block: &Block) -> LedgerResult<String> {
        let _guard = self.lock.write();
        self.commit_locked(block)
    }

    /// Build a block on top of the current head from `transactions`, sign it
    /// with `keypair` if one is given, and append it.
    ///
    /// The head is read while the write lock is held, so two producers can
    /// never build on the same parent.
    pub fn append_transactions(
        &self,
        transactions: Vec<Transaction>,
        signer_id: &str,
        keypair: Option<&SignerKeypair>,
    ) -> LedgerResult<(String, Block)> {
        let _guard = self.lock.write();
        let prev_hash = self.store.head()?;
        let mut block = Block::new(prev_hash, transactions, signer_id);
        if let Some(kp) = keypair {
            block.sign(kp);
        }
        let hash = self.commit_locked(&block)?;
        Ok((hash, block))
    }

    fn commit_locked(&self, block: &Block) -> LedgerResult<String> {
        let hash = block_hash(block);
        debug!(
            hash = %hash,
            prev = %block.header.prev_hash,
            txs = block.transactions.len(),
            "appending block"
        );
        self.store.commit_block(&hash, block)?;
        info!(hash = %hash, signer = %block.header.signer_id, "head advanced");
        Ok(hash)
    }

    pub fn get_block(&self, hash: &str) -> LedgerResult<Block> {
        let _guard = self.lock.read();
        self.store.get_block(hash)
    }

    /// Hash of the newest block, or `""` for an empty chain.
    pub fn head(&self) -> LedgerResult<String> {
        let _guard = self.lock.read();
        self.store.head()
    }

    /// The newest block, if any.
    pub fn head_block(&self) -> LedgerResult<Option<StoredBlock>> {
        let _guard = self.lock.read();
        let hash = self.store.head()?;
        if hash.is_empty() {
            return Ok(None);
        }
        let block = self.store.get_block(&hash).map_err(|e| {
            if e.is_not_found() {
                LedgerError::ChainIntegrity(format!("head {hash} has no stored block"))
            } else {
                e
            }
        })?;
        Ok(Some(StoredBlock { hash, block }))
    }

    /// Visit every stored block, in no particular order, under the read lock.
    ///
    /// The visitor must not call back into this `Chain`.
    pub fn for_each_block<F>(&self, mut visit: F) -> LedgerResult<()>
    where
        F: FnMut(&str, &Block) -> LedgerResult<()>,
    {
        let _guard = self.lock.read();
        self.store.for_each_block(&mut visit)
    }

    pub fn block_count(&self) -> LedgerResult<usize> {
        let _guard = self.lock.read();
        self.store.block_count()
    }

    /// Backward cursor from `start_hash`. Appends wait until it is dropped.
    pub fn iter(&self, start_hash: &str) -> ChainCursor<'_> {
        let guard = self.lock.read();
        ChainCursor {
            inner: ChainIter::new(&self.store, start_hash),
            _guard: guard,
        }
    }

    /// Backward cursor from the current head, read under the same lock.
    pub fn iter_from_head(&self) -> LedgerResult<ChainCursor<'_>> {
        let guard = self.lock.read();
        let head = self.store.head()?;
        Ok(ChainCursor {
            inner: ChainIter::new(&self.store, head),
            _guard: guard,
        })
    }

    pub fn flush(&self) -> LedgerResult<()> {
        self.store.flush()
    }
}

// ---------------------------------------------------------------------------
// ChainCursor
// ---------------------------------------------------------------------------

/// A [`ChainIter`] that holds the chain's read lock while alive.
///
/// Calling other `Chain` methods from the thread that holds a cursor can
/// deadlock once a writer is queued; finish with the cursor first.
pub struct ChainCursor<'a> {
    inner: ChainIter<'a>,
    _guard: RwLockReadGuard<'a, ()>,
}

impl ChainCursor<'_> {
    /// See [`ChainIter::err`].
    pub fn err(&self) -> Option<&LedgerError> {
        self.inner.err()
    }

    /// See [`ChainIter::missing`].
    pub fn missing(&self) -> Option<&str> {
        self.inner.missing()
    }

    /// Releases the read lock, returning the error that ended the walk.
    pub fn into_err(self) -> Option<LedgerError> {
        self.inner.into_err()
    }
}

impl Iterator for ChainCursor<'_> {
    type Item = StoredBlock;

    fn next(&mut self) -> Option<StoredBlock> {
        self.inner.next()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
