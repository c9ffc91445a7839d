// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Read-only ledger queries used by the upload, evaluation and release
//! workflows. Every query runs under the chain's read lock.
//!
//! Full scans (`for_each_block`) visit blocks in storage order, not chain
//! order. Queries whose answer depends on recency walk backward from the
//! head instead.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::coordinator::Chain;
use crate::config::{META_PDF_CID, META_RESULT_RELEASE};
use crate::error::{LedgerError, LedgerResult};
use crate::storage::BlockStore;
use crate::transaction::{Transaction, TxKind};

/// One transaction located in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEvent {
    pub block_hash: String,
    /// Timestamp of the containing block.
    pub block_timestamp: i64,
    pub kind: TxKind,
    pub transaction: Transaction,
}

/// Aggregate counts over every stored block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    pub head: String,
    pub blocks: usize,
    pub transactions: usize,
    pub records: usize,
    pub uploads: usize,
    pub evaluations: usize,
    pub result_releases: usize,
    /// Distinct non-empty script ids.
    pub scripts: usize,
}

impl<S: BlockStore> Chain<S> {
    /// Metadata of a script, looked up by id (trimmed, case-insensitive).
    ///
    /// The upload record's `meta` is preferred; otherwise the first matching
    /// transaction found wins. The returned map gains `pdf_cid` set to that
    /// transaction's CID.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] when no transaction carries the script id.
    pub fn script_metadata(&self, script_id: &str) -> LedgerResult<BTreeMap<String, String>> {
        let mut upload: Option<Transaction> = None;
        let mut first: Option<Transaction> = None;

        self.for_each_block(|_, block| {
            for tx in block.transactions.iter().filter(|t| t.is_for_script(script_id)) {
                if upload.is_none() && tx.kind() == TxKind::Upload {
                    upload = Some(tx.clone());
                }
                if first.is_none() {
                    first = Some(tx.clone());
                }
            }
            Ok(())
        })?;

        let tx = upload
            .or(first)
            .ok_or_else(|| LedgerError::NotFound(format!("script {}", script_id.trim())))?;
        let mut meta = tx.meta;
        meta.insert(META_PDF_CID.to_string(), tx.cid);
        Ok(meta)
    }

    /// Distinct script ids recorded for a course in a semester, sorted.
    pub fn scripts_for_course(&self, course_id: &str, semester: &str) -> LedgerResult<Vec<String>> {
        let mut ids = BTreeSet::new();
        self.for_each_block(|_, block| {
            for tx in &block.transactions {
                if tx.course_id == course_id
                    && tx.semester == semester
                    && !tx.script_id.trim().is_empty()
                {
                    ids.insert(tx.script_id.clone());
                }
            }
            Ok(())
        })?;
        Ok(ids.into_iter().collect())
    }

    /// Every event for a script, newest first, following the chain from head.
    pub fn script_history(&self, script_id: &str) -> LedgerResult<Vec<LedgerEvent>> {
        self.collect_from_head(|tx| tx.is_for_script(script_id))
    }

    /// Result releases for `semester`, newest first. An empty
    /// `academic_year` matches any year.
    pub fn result_releases(&self, semester: &str, academic_year: &str) -> LedgerResult<Vec<LedgerEvent>> {
        self.collect_from_head(|tx| {
            tx.meta.contains_key(META_RESULT_RELEASE)
                && tx.semester == semester
                && (academic_year.is_empty() || tx.academic_year == academic_year)
        })
    }

    /// Counts over all stored blocks.
    pub fn chain_stats(&self) -> LedgerResult<ChainStats> {
        let mut stats = ChainStats {
            head: self.head()?,
            ..ChainStats::default()
        };
        let mut scripts = BTreeSet::new();
        self.for_each_block(|_, block| {
            stats.blocks += 1;
            for tx in &block.transactions {
                stats.transactions += 1;
                match tx.kind() {
                    TxKind::Record => stats.records += 1,
                    TxKind::Upload => stats.uploads += 1,
                    TxKind::Evaluation => stats.evaluations += 1,
                    TxKind::ResultRelease => stats.result_releases += 1,
                }
                let id = tx.script_id.trim();
                if !id.is_empty() {
                    scripts.insert(id.to_ascii_lowercase());
                }
            }
            Ok(())
        })?;
        stats.scripts = scripts.len();
        Ok(stats)
    }

    fn collect_from_head<P>(&self, mut matches: P) -> LedgerResult<Vec<LedgerEvent>>
    where
        P: FnMut(&Transaction) -> bool,
    {
        let mut cursor = self.iter_from_head()?;
        let mut events = Vec::new();
        for stored in cursor.by_ref() {
            for tx in &stored.block.transactions {
                if matches(tx) {
                    events.push(LedgerEvent {
                        block_hash: stored.hash.clone(),
                        block_timestamp: stored.block.header.timestamp,
                        kind: tx.kind(),
                        transaction: tx.clone(),
                    });
                }
            }
        }
        match cursor.into_err() {
            Some(e) => Err(e),
            None => Ok(events),
        }
    }
}
