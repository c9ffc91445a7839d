// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! In-memory block store.
//!
//! Keeps encoded blocks in a `HashMap` keyed by hash and the head in a
//! separate slot. Blocks are held as the same JSON bytes the sled backend
//! writes, so decode behaviour (and `for_each_block` skipping) matches.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::warn;

use super::block::Block;
use super::{BlockStore, BlockVisitor};
use crate::codec;
use crate::error::{LedgerError, LedgerResult};

/// In-memory implementation of [`BlockStore`].
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<String, Vec<u8>>>,
    head: RwLock<String>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    /// Store raw bytes under `hash`, bypassing encoding. Lets tests plant
    /// entries that do not decode.
    pub fn insert_raw(&self, hash: impl Into<String>, bytes: Vec<u8>) {
        self.blocks.write().insert(hash.into(), bytes);
    }
}

impl BlockStore for InMemoryBlockStore {
    fn put_block(&self, hash: &str, block: &Block) -> LedgerResult<()> {
        let bytes = codec::to_vec(block).map_err(|e| LedgerError::storage("put_block", e))?;
        self.blocks.write().entry(hash.to_string()).or_insert(bytes);
        Ok(())
    }

    fn get_block(&self, hash: &str) -> LedgerResult<Block> {
        let blocks = self.blocks.read();
        let bytes = blocks
            .get(hash)
            .ok_or_else(|| LedgerError::NotFound(format!("block {hash}")))?;
        serde_json::from_slice(bytes).map_err(|e| LedgerError::storage("get_block", e))
    }

    fn for_each_block(&self, visit: &mut BlockVisitor<'_>) -> LedgerResult<()> {
        // Snapshot so the visitor may call back into the store.
        let entries: Vec<(String, Vec<u8>)> = self
            .blocks
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (hash, bytes) in entries {
            match serde_json::from_slice::<Block>(&bytes) {
                Ok(block) => visit(&hash, &block)?,
                Err(e) => warn!(hash = %hash, error = %e, "skipping undecodable block"),
            }
        }
        Ok(())
    }

    fn set_head(&self, hash: &str) -> LedgerResult<()> {
        *self.head.write() = hash.to_string();
        Ok(())
    }

    fn head(&self) -> LedgerResult<String> {
        Ok(self.head.read().clone())
    }

    fn block_count(&self) -> LedgerResult<usize> {
        Ok(self.len())
    }
}
