// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # SledBlockStore: On-Disk Storage Engine
//!
//! The persistence layer for the exam ledger, built on sled's embedded
//! key-value store. All on-disk data flows through this module.
//!
//! ## Tree Layout
//!
//! | Tree         | Key                    | Value               |
//! |--------------|------------------------|---------------------|
//! | `blocks`     | hex block hash (UTF-8) | canonical JSON block |
//! | `chain_meta` | `head`                 | hex head hash (UTF-8) |
//!
//! ## Atomicity
//!
//! [`BlockStore::commit_block`] writes the block and moves the head inside
//! one multi-tree sled transaction: either both land or neither does. The
//! standalone [`BlockStore::put_block`] and [`BlockStore::set_head`] remain
//! available and keep their individual semantics.
//!
//! ## Locking
//!
//! sled takes an exclusive lock on the database file. A second process
//! opening the same path retries until [`LedgerConfig::open_timeout`] runs
//! out and then fails with a storage error instead of blocking forever.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::block::Block;
use super::{BlockStore, BlockVisitor};
use crate::codec;
use crate::config::{LedgerConfig, HEAD_KEY, OPEN_RETRY_INTERVAL, TREE_BLOCKS, TREE_CHAIN_META};
use crate::error::{LedgerError, LedgerResult};

// ---------------------------------------------------------------------------
// SledBlockStore
// ---------------------------------------------------------------------------

/// Persistent block store backed by sled.
///
/// # Thread Safety
///
/// sled trees support concurrent reads and serialized writes internally, so
/// the store is `Send + Sync` and can be shared via `Arc`. Ordering of
/// appends is the coordinator's job.
#[derive(Debug, Clone)]
pub struct SledBlockStore {
    db: Db,
    /// Blocks keyed by hex content hash.
    blocks: Tree,
    /// Holds the head pointer.
    meta: Tree,
    flush_on_append: bool,
}

impl SledBlockStore {
    /// Open or create the database described by `config`.
    ///
    /// While another holder has the file locked, opening is retried every
    /// [`OPEN_RETRY_INTERVAL`] until `config.open_timeout` elapses.
    pub fn open(config: &LedgerConfig) -> LedgerResult<Self> {
        if config.temporary {
            return Self::open_temporary();
        }
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LedgerError::storage("open", e))?;
            }
        }

        let deadline = Instant::now() + config.open_timeout;
        let mut attempts = 0u32;
        let db = loop {
            attempts += 1;
            match sled::Config::new().path(&config.path).open() {
                Ok(db) => break db,
                Err(sled::Error::Io(e)) if Instant::now() < deadline => {
                    debug!(attempt = attempts, error = %e, "ledger database busy, retrying");
                    thread::sleep(OPEN_RETRY_INTERVAL);
                }
                Err(e) => {
                    return Err(LedgerError::storage(
                        "open",
                        format!("{} (after {attempts} attempts): {e}", config.path.display()),
                    ))
                }
            }
        };

        let store = Self::from_db(db, config.flush_on_append)?;
        info!(path = %config.path.display(), blocks = store.blocks.len(), "ledger database opened");
        Ok(store)
    }

    /// Create a temporary database that is removed when the store is dropped.
    ///
    /// No filesystem side effects worth cleaning up; meant for tests.
    pub fn open_temporary() -> LedgerResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| LedgerError::storage("open", e))?;
        Self::from_db(db, false)
    }

    fn from_db(db: Db, flush_on_append: bool) -> LedgerResult<Self> {
        let blocks = db
            .open_tree(TREE_BLOCKS)
            .map_err(|e| LedgerError::storage("open_tree", e))?;
        let meta = db
            .open_tree(TREE_CHAIN_META)
            .map_err(|e| LedgerError::storage("open_tree", e))?;
        Ok(Self {
            db,
            blocks,
            meta,
            flush_on_append,
        })
    }

    /// Size of the database on disk, in bytes.
    pub fn size_on_disk(&self) -> LedgerResult<u64> {
        self.db
            .size_on_disk()
            .map_err(|e| LedgerError::storage("size_on_disk", e))
    }

    /// Raw stored bytes for `hash`, without decoding.
    pub fn get_raw(&self, hash: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self
            .blocks
            .get(hash.as_bytes())
            .map_err(|e| LedgerError::storage("get_block", e))?
            .map(|v| v.to_vec()))
    }

    fn encode(op: &'static str, block: &Block) -> LedgerResult<Vec<u8>> {
        codec::to_vec(block).map_err(|e| LedgerError::storage(op, e))
    }
}

impl BlockStore for SledBlockStore {
    fn put_block(&self, hash: &str, block: &Block) -> LedgerResult<()> {
        let bytes = Self::encode("put_block", block)?;
        let swapped = self
            .blocks
            .compare_and_swap(hash.as_bytes(), None as Option<&[u8]>, Some(bytes))
            .map_err(|e| LedgerError::storage("put_block", e))?;
        if swapped.is_err() {
            debug!(hash = %hash, "block already stored, keeping original bytes");
        }
        Ok(())
    }

    fn get_block(&self, hash: &str) -> LedgerResult<Block> {
        let bytes = self
            .blocks
            .get(hash.as_bytes())
            .map_err(|e| LedgerError::storage("get_block", e))?
            .ok_or_else(|| LedgerError::NotFound(format!("block {hash}")))?;
        serde_json::from_slice(&bytes).map_err(|e| LedgerError::storage("get_block", e))
    }

    fn for_each_block(&self, visit: &mut BlockVisitor<'_>) -> LedgerResult<()> {
        for entry in self.blocks.iter() {
            let (key, value) = entry.map_err(|e| LedgerError::storage("for_each_block", e))?;
            let hash = String::from_utf8_lossy(&key);
            match serde_json::from_slice::<Block>(&value) {
                Ok(block) => visit(&hash, &block)?,
                Err(e) => warn!(hash = %hash, error = %e, "skipping undecodable block"),
            }
        }
        Ok(())
    }

    fn set_head(&self, hash: &str) -> LedgerResult<()> {
        self.meta
            .insert(HEAD_KEY, hash.as_bytes())
            .map_err(|e| LedgerError::storage("set_head", e))?;
        Ok(())
    }

    fn head(&self) -> LedgerResult<String> {
        match self
            .meta
            .get(HEAD_KEY)
            .map_err(|e| LedgerError::storage("head", e))?
        {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map_err(|e| LedgerError::storage("head", e)),
            None => Ok(String::new()),
        }
    }

    fn block_count(&self) -> LedgerResult<usize> {
        Ok(self.blocks.len())
    }

    fn commit_block(&self, hash: &str, block: &Block) -> LedgerResult<()> {
        let bytes = Self::encode("commit_block", block)?;
        let key = hash.as_bytes();

        (&self.blocks, &self.meta)
            .transaction(|(blocks, meta)| {
                if blocks.get(key)?.is_none() {
                    blocks.insert(key, bytes.as_slice())?;
                }
                meta.insert(HEAD_KEY, key)?;
                Ok::<(), ConflictableTransactionError<String>>(())
            })
            .map_err(|e: TransactionError<String>| LedgerError::storage("commit_block", e))?;

        if self.flush_on_append {
            self.flush()?;
        }
        info!(hash = %hash, txs = block.transactions.len(), "block committed");
        Ok(())
    }

    fn flush(&self) -> LedgerResult<()> {
        self.db
            .flush()
            .map_err(|e| LedgerError::storage("flush", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
