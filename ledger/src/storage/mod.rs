// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Storage Module
//!
//! Persistence for the exam ledger. Blocks are stored under their content
//! hash and never rewritten; a single head pointer names the newest block.
//!
//! ## Architecture
//!
//! ```text
//! block.rs  : Block and BlockHeader, merkle root, content hash, signing
//! db.rs     : SledBlockStore, the on-disk backend
//! mem.rs    : InMemoryBlockStore, for tests and dry runs
//! iter.rs   : ChainIter, the backward cursor from any hash to genesis
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! Transaction → Block → Chain::append_block → BlockStore::commit_block
//!                                                 ├── blocks[hash] = json(block)
//!                                                 └── chain_meta["head"] = hash
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Content addressing.** The key of a block is its hash, so identical
//!    content collapses onto one entry and a put under an existing key is a
//!    no-op rather than an overwrite.
//!
//! 2. **JSON on disk.** The stored bytes are the same canonical JSON the
//!    hash is computed from, so a block can be re-hashed straight from disk.
//!
//! 3. **Two-phase by default.** [`BlockStore::commit_block`] writes the
//!    block and then moves the head. A crash in between leaves a durable but
//!    unreferenced block and the old head, which is safe. The sled backend
//!    does both in one transaction.

pub mod block;
pub mod db;
pub mod iter;
pub mod mem;

pub use block::{block_hash, compute_merkle_root, Block, BlockHeader};
pub use db::SledBlockStore;
pub use iter::{ChainIter, StoredBlock};
pub use mem::InMemoryBlockStore;

use crate::error::LedgerResult;

/// Callback for [`BlockStore::for_each_block`]. Returning an error stops the
/// scan and propagates the error.
pub type BlockVisitor<'a> = dyn FnMut(&str, &Block) -> LedgerResult<()> + 'a;

/// A content-addressed block store with a single head pointer.
///
/// Implementations must be safe to share between threads. They do not
/// serialize writers themselves; [`crate::chain::Chain`] does.
pub trait BlockStore: Send + Sync {
    /// Store `block` under `hash`. A no-op when `hash` is already present.
    fn put_block(&self, hash: &str, block: &Block) -> LedgerResult<()>;

    /// Load the block stored under `hash`.
    ///
    /// # Errors
    ///
    /// [`crate::LedgerError::NotFound`] if no such block exists.
    fn get_block(&self, hash: &str) -> LedgerResult<Block>;

    /// Visit every stored block in unspecified order. Entries that fail to
    /// decode are skipped.
    fn for_each_block(&self, visit: &mut BlockVisitor<'_>) -> LedgerResult<()>;

    /// Point the head at `hash`.
    fn set_head(&self, hash: &str) -> LedgerResult<()>;

    /// The current head hash, or `""` if nothing was ever appended.
    fn head(&self) -> LedgerResult<String>;

    /// Number of stored blocks, referenced or not.
    fn block_count(&self) -> LedgerResult<usize>;

    /// Store `block` and advance the head to it.
    ///
    /// If the put fails the head is untouched. If the put succeeds and the
    /// head update fails, the block stays stored and the old head remains.
    fn commit_block(&self, hash: &str, block: &Block) -> LedgerResult<()> {
        self.put_block(hash, block)?;
        self.set_head(hash)
    }

    /// Make previous writes durable.
    fn flush(&self) -> LedgerResult<()> {
        Ok(())
    }
}

impl<S: BlockStore + ?Sized> BlockStore for std::sync::Arc<S> {
    fn put_block(&self, hash: &str, block: &Block) -> LedgerResult<()> {
        (**self).put_block(hash, block)
    }

    fn get_block(&self, hash: &str) -> LedgerResult<Block> {
        (**self).get_block(hash)
    }

    fn for_each_block(&self, visit: &mut BlockVisitor<'_>) -> LedgerResult<()> {
        (**self).for_each_block(visit)
    }

    fn set_head(&self, hash: &str) -> LedgerResult<()> {
        (**self).set_head(hash)
    }

    fn head(&self) -> LedgerResult<String> {
        (**self).head()
    }

    fn block_count(&self) -> LedgerResult<usize> {
        (**self).block_count()
    }

    fn commit_block(&self, hash: &str, block: &Block) -> LedgerResult<()> {
        (**self).commit_block(hash, block)
    }

    fn flush(&self) -> LedgerResult<()> {
        (**self).flush()
    }
}
