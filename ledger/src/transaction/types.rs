// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Event classification for ledger transactions.
//!
//! The persisted format has no explicit type tag: workflows mark a
//! transaction's purpose by storing a namespaced key in `meta`. [`TxKind`]
//! recovers that purpose so queries and validation can branch on it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{META_EVALUATION, META_RESULT_RELEASE, META_UPLOAD_RECORD};

/// What a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TxKind {
    /// A script record without any namespaced marker.
    Record,
    /// The original script upload (`_upload_record`).
    Upload,
    /// Marks awarded by an evaluator (`_evaluation`).
    Evaluation,
    /// An aggregate release of results for a semester (`_result_release`).
    ResultRelease,
}

impl TxKind {
    /// Classify by meta keys. A release marker wins over an evaluation
    /// marker, which wins over an upload marker.
    pub fn from_meta(meta: &BTreeMap<String, String>) -> Self {
        if meta.contains_key(META_RESULT_RELEASE) {
            Self::ResultRelease
        } else if meta.contains_key(META_EVALUATION) {
            Self::Evaluation
        } else if meta.contains_key(META_UPLOAD_RECORD) {
            Self::Upload
        } else {
            Self::Record
        }
    }

    /// The meta key that marks this kind, if any.
    pub fn meta_key(self) -> Option<&'static str> {
        match self {
            Self::Record => None,
            Self::Upload => Some(META_UPLOAD_RECORD),
            Self::Evaluation => Some(META_EVALUATION),
            Self::ResultRelease => Some(META_RESULT_RELEASE),
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => write!(f, "record"),
            Self::Upload => write!(f, "upload"),
            Self::Evaluation => write!(f, "evaluation"),
            Self::ResultRelease => write!(f, "result_release"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(keys: &[&str]) -> BTreeMap<String, String> {
        keys.iter().map(|k| (k.to_string(), "x".to_string())).collect()
    }

    #[test]
    fn classifies_by_marker() {
        assert_eq!(TxKind::from_meta(&meta(&[])), TxKind::Record);
        assert_eq!(TxKind::from_meta(&meta(&["USN"])), TxKind::Record);
        assert_eq!(TxKind::from_meta(&meta(&[META_UPLOAD_RECORD])), TxKind::Upload);
        assert_eq!(TxKind::from_meta(&meta(&[META_EVALUATION])), TxKind::Evaluation);
        assert_eq!(
            TxKind::from_meta(&meta(&[META_RESULT_RELEASE])),
            TxKind::ResultRelease
        );
    }

    #[test]
    fn release_marker_takes_precedence() {
        let m = meta(&[META_UPLOAD_RECORD, META_RESULT_RELEASE]);
        assert_eq!(TxKind::from_meta(&m), TxKind::ResultRelease);
    }

    #[test]
    fn meta_key_roundtrips_through_from_meta() {
        for kind in [TxKind::Upload, TxKind::Evaluation, TxKind::ResultRelease] {
            let key = kind.meta_key().unwrap();
            assert_eq!(TxKind::from_meta(&meta(&[key])), kind);
        }
        assert!(TxKind::Record.meta_key().is_none());
    }
}
