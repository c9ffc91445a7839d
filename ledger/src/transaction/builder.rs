// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] assembles a [`Transaction`] field by field and
//! stamps `created_at` at build time unless one was given. It does not
//! validate: a release aggregate legitimately has no script id, so the
//! required-field rules live in [`super::verification`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::TxKind;
use crate::codec::{self, base64_bytes, null_as_default};
use crate::config::{META_EVALUATION, META_RESULT_RELEASE, META_UPLOAD_RECORD};
use crate::crypto::hash::sha256;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One exam-script lifecycle event.
///
/// # Persisted Form
///
/// Field order and JSON names are part of the content hash and must not
/// change. `meta` is omitted when empty and `extra_sig` is omitted when
/// absent, so records written without them hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    /// Unique identifier of the exam script.
    pub script_id: String,
    /// University seat number of the student.
    pub usn: String,
    pub course_id: String,
    pub semester: String,
    pub academic_year: String,
    /// Credit weight of the course.
    #[serde(rename = "credits")]
    pub course_credits: i64,
    /// Content identifier of the scanned script in external object storage.
    pub cid: String,
    /// Extensible per-event payload, keyed by name. Namespaced keys
    /// (`_upload_record`, `_evaluation`, `_result_release`) mark the kind.
    #[serde(
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub meta: BTreeMap<String, String>,
    /// Unix seconds.
    pub created_at: i64,
    pub signer_id: String,
    /// Optional secondary signature, see [`super::signing`].
    #[serde(skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub extra_sig: Vec<u8>,
}

impl Transaction {
    /// Canonical JSON bytes of this transaction, as fed into the merkle root
    /// and the block hash.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // Plain structs with string-keyed maps cannot fail to serialize.
        codec::to_vec(self).unwrap_or_default()
    }

    /// SHA-256 of [`Self::canonical_bytes`]: this transaction's merkle leaf.
    pub fn leaf_hash(&self) -> [u8; 32] {
        sha256(&self.canonical_bytes())
    }

    /// The event kind encoded in `meta`.
    pub fn kind(&self) -> TxKind {
        TxKind::from_meta(&self.meta)
    }

    /// Convenience lookup into `meta`.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// `true` if the script id matches `script_id` ignoring case and
    /// surrounding whitespace.
    pub fn is_for_script(&self, script_id: &str) -> bool {
        let wanted = script_id.trim();
        !wanted.is_empty() && self.script_id.trim().eq_ignore_ascii_case(wanted)
    }

    /// Returns `true` if a secondary signature is attached.
    pub fn is_cosigned(&self) -> bool {
        !self.extra_sig.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Transaction`].
///
/// ```
/// use exam_ledger::transaction::TransactionBuilder;
///
/// let tx = TransactionBuilder::new("script-001")
///     .usn("1RV21CS001")
///     .course("CS101", "5")
///     .academic_year("2025-26")
///     .cid("bafybeigdyrzt")
///     .upload_record()
///     .signer("examiner-1")
///     .build();
///
/// assert_eq!(tx.kind(), exam_ledger::TxKind::Upload);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    tx: Transaction,
    created_at: Option<i64>,
}

impl TransactionBuilder {
    /// Starts a record for `script_id`. Pass `""` for aggregate events that
    /// are not tied to a single script.
    pub fn new(script_id: impl Into<String>) -> Self {
        Self {
            tx: Transaction {
                script_id: script_id.into(),
                ..Transaction::default()
            },
            created_at: None,
        }
    }

    pub fn usn(mut self, usn: impl Into<String>) -> Self {
        self.tx.usn = usn.into();
        self
    }

    /// Sets course id and semester together; they are always queried as a pair.
    pub fn course(mut self, course_id: impl Into<String>, semester: impl Into<String>) -> Self {
        self.tx.course_id = course_id.into();
        self.tx.semester = semester.into();
        self
    }

    pub fn semester(mut self, semester: impl Into<String>) -> Self {
        self.tx.semester = semester.into();
        self
    }

    pub fn academic_year(mut self, year: impl Into<String>) -> Self {
        self.tx.academic_year = year.into();
        self
    }

    pub fn credits(mut self, credits: i64) -> Self {
        self.tx.course_credits = credits;
        self
    }

    pub fn cid(mut self, cid: impl Into<String>) -> Self {
        self.tx.cid = cid.into();
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tx.meta.insert(key.into(), value.into());
        self
    }

    /// Merges a whole metadata map, e.g. the output of the extractor.
    pub fn extend_meta<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tx
            .meta
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Marks the transaction as the script's upload record.
    pub fn upload_record(self) -> Self {
        self.meta(META_UPLOAD_RECORD, "true")
    }

    /// Marks the transaction as an evaluation carrying `marks_json`.
    pub fn evaluation(self, marks_json: impl Into<String>) -> Self {
        self.meta(META_EVALUATION, marks_json)
    }

    /// Marks the transaction as a result release carrying `records_json`.
    pub fn result_release(self, records_json: impl Into<String>) -> Self {
        self.meta(META_RESULT_RELEASE, records_json)
    }

    pub fn signer(mut self, signer_id: impl Into<String>) -> Self {
        self.tx.signer_id = signer_id.into();
        self
    }

    /// Pins `created_at` (unix seconds). Defaults to now at build time.
    pub fn created_at(mut self, unix_secs: i64) -> Self {
        self.created_at = Some(unix_secs);
        self
    }

    pub fn build(self) -> Transaction {
        let mut tx = self.tx;
        tx.created_at = self.created_at.unwrap_or_else(|| Utc::now().timestamp());
        tx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
