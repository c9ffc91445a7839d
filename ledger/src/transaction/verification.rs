// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Required-field checks.
//!
//! [`validate_script_record`] is the strict check workflows run on a script
//! record before it goes into a block. [`validate_transaction`] is what the
//! chain validator applies to stored transactions, and it knows that an
//! evaluation carries neither CID nor USN (marking is anonymous) and a result
//! release is not tied to one script.

use super::builder::Transaction;
use super::types::TxKind;
use crate::config::META_RESULT_RELEASE;
use crate::error::{LedgerError, LedgerResult};

/// Names of the identity fields that are empty, in declaration order.
/// Whitespace counts as a value.
pub fn missing_fields(tx: &Transaction) -> Vec<&'static str> {
    [
        ("script_id", &tx.script_id),
        ("usn", &tx.usn),
        ("course_id", &tx.course_id),
        ("semester", &tx.semester),
        ("cid", &tx.cid),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect()
}

fn require(tx: &Transaction, required: &[&str]) -> LedgerResult<()> {
    let missing: Vec<&str> = missing_fields(tx)
        .into_iter()
        .filter(|name| required.contains(name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Strict check: script id, USN, course id, semester and CID must all be
/// present.
pub fn validate_script_record(tx: &Transaction) -> LedgerResult<()> {
    require(tx, &["script_id", "usn", "course_id", "semester", "cid"])
}

/// Check a transaction according to its [`TxKind`].
///
/// | Kind          | Required                                    |
/// |---------------|---------------------------------------------|
/// | Record/Upload | script_id, usn, course_id, semester, cid    |
/// | Evaluation    | script_id, course_id, semester              |
/// | ResultRelease | semester and a non-empty `_result_release`  |
pub fn validate_transaction(tx: &Transaction) -> LedgerResult<()> {
    match tx.kind() {
        TxKind::Record | TxKind::Upload => validate_script_record(tx),
        TxKind::Evaluation => require(tx, &["script_id", "course_id", "semester"]),
        TxKind::ResultRelease => {
            require(tx, &["semester"])?;
            match tx.meta_value(META_RESULT_RELEASE) {
                Some(payload) if !payload.trim().is_empty() => Ok(()),
                _ => Err(LedgerError::Validation(
                    "result release carries no records".into(),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::builder::TransactionBuilder;

    fn full() -> TransactionBuilder {
        TransactionBuilder::new("script-1")
            .usn("1RV21CS001")
            .course("CS101", "5")
            .cid("bafy1")
            .created_at(1)
    }

    #[test]
    fn complete_record_passes() {
        let tx = full().build();
        assert!(missing_fields(&tx).is_empty());
        assert!(validate_script_record(&tx).is_ok());
        assert!(validate_transaction(&tx).is_ok());
    }

    #[test]
    fn reports_every_missing_field() {
        let tx = TransactionBuilder::new("").build();
        assert_eq!(
            missing_fields(&tx),
            vec!["script_id", "usn", "course_id", "semester", "cid"]
        );
        let err = validate_script_record(&tx).unwrap_err();
        assert!(err.to_string().contains("script_id, usn, course_id, semester, cid"));
    }

    #[test]
    fn each_identity_field_is_required() {
        let cases: [fn(&mut Transaction); 5] = [
            |t| t.script_id.clear(),
            |t| t.usn.clear(),
            |t| t.course_id.clear(),
            |t| t.semester.clear(),
            |t| t.cid.clear(),
        ];
        for clear in cases {
            let mut tx = full().build();
            clear(&mut tx);
            assert!(matches!(
                validate_script_record(&tx),
                Err(LedgerError::Validation(_))
            ));
        }
    }

    #[test]
    fn evaluation_needs_no_cid() {
        let tx = full().cid("").evaluation(r#"{"q1":5}"#).build();
        assert!(validate_script_record(&tx).is_err());
        assert!(validate_transaction(&tx).is_ok());
    }

    #[test]
    fn whitespace_counts_as_present() {
        let mut tx = full().usn("\t").build();
        tx.script_id = " ".into();
        assert!(missing_fields(&tx).is_empty());
        assert!(validate_transaction(&tx).is_ok());
    }

    #[test]
    fn evaluation_needs_no_usn() {
        let tx = full().usn("").cid("").evaluation(r#"{"q1":5}"#).build();
        assert!(validate_script_record(&tx).is_err());
        assert!(validate_transaction(&tx).is_ok());
    }

    #[test]
    fn evaluation_still_needs_script_identity() {
        let tx = TransactionBuilder::new("")
            .course("CS101", "5")
            .evaluation("{}")
            .build();
        assert!(validate_transaction(&tx).is_err());
    }

    #[test]
    fn result_release_rules() {
        let ok = TransactionBuilder::new("")
            .semester("5")
            .result_release(r#"[{"usn":"1RV21CS001"}]"#)
            .build();
        assert!(validate_transaction(&ok).is_ok());

        let empty_payload = TransactionBuilder::new("")
            .semester("5")
            .result_release(" ")
            .build();
        assert!(validate_transaction(&empty_payload).is_err());

        let no_semester = TransactionBuilder::new("").result_release("[1]").build();
        assert!(validate_transaction(&no_semester).is_err());
    }
}
