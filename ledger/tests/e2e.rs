// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! End-to-end integration tests for the exam ledger.
//!
//! These tests drive the public API the way the upload, evaluation and
//! release workflows do: build transactions, append blocks through a shared
//! `Chain`, read them back, and validate the whole chain. Persistence tests
//! use a real on-disk sled database in a temporary directory.
//!
//! Each test stands alone with its own database.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use exam_ledger::{
    Block, BlockStore, Chain, KeyRing, LedgerConfig, LedgerError, SignerKeypair,
    SledBlockStore, Transaction, TransactionBuilder, TxKind,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn temp_chain() -> Chain<SledBlockStore> {
    Chain::new(SledBlockStore::open_temporary().expect("temp db"))
}

/// An upload record the way the upload workflow writes it.
fn upload_tx(script_id: &str, usn: &str) -> Transaction {
    TransactionBuilder::new(script_id)
        .usn(usn)
        .course("CS101", "5")
        .academic_year("2025-26")
        .credits(4)
        .cid(format!("bafy-{}", uuid::Uuid::new_v4()))
        .meta("USN", usn)
        .meta("Course Code", "CS101")
        .upload_record()
        .signer("examiner-1")
        .build()
}

fn evaluation_tx(script_id: &str, usn: &str) -> Transaction {
    TransactionBuilder::new(script_id)
        .usn(usn)
        .course("CS101", "5")
        .evaluation(r#"{"q1":9,"q2":8,"total":17}"#)
        .signer("evaluator-7")
        .build()
}

// ---------------------------------------------------------------------------
// Append and read back
// ---------------------------------------------------------------------------

#[test]
fn two_block_scenario() {
    let chain = temp_chain();

    let a = Block::new("", vec![upload_tx("script-1", "1RV21CS001")], "examiner-1");
    let ha = chain.append_block(&a).unwrap();
    assert_eq!(ha, a.hash());
    assert_eq!(chain.head().unwrap(), ha);

    let b = Block::new(ha.clone(), vec![evaluation_tx("script-1", "1RV21CS001")], "evaluator-7");
    let hb = chain.append_block(&b).unwrap();
    assert_eq!(chain.head().unwrap(), hb);

    let walked: Vec<String> = chain.iter(&hb).map(|s| s.hash).collect();
    assert_eq!(walked, vec![hb.clone(), ha.clone()]);

    assert_eq!(chain.get_block(&ha).unwrap(), a);
    assert_eq!(chain.get_block(&hb).unwrap(), b);
}

#[test]
fn head_tracks_the_last_append() {
    let chain = temp_chain();
    let mut last = String::new();
    for i in 0..10 {
        let tx = upload_tx(&format!("script-{i}"), "1RV21CS001");
        let block = Block::new(last.clone(), vec![tx], "examiner-1");
        last = chain.append_block(&block).unwrap();
    }
    assert_eq!(chain.head().unwrap(), last);

    let mut cursor = chain.iter(&last);
    assert_eq!(cursor.by_ref().count(), 10);
    assert!(cursor.err().is_none());
    assert!(cursor.missing().is_none());
}

#[test]
fn missing_hash_is_not_found() {
    let chain = temp_chain();
    let err = chain.get_block(&"0".repeat(64)).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn duplicate_put_keeps_original_bytes() {
    let chain = temp_chain();
    let original = Block::new_at("", vec![upload_tx("s", "u")], "examiner-1", 100);
    let hash = chain.append_block(&original).unwrap();

    let imposter = Block::new_at("", vec![upload_tx("other", "u")], "examiner-1", 200);
    chain.store().put_block(&hash, &imposter).unwrap();
    assert_eq!(chain.get_block(&hash).unwrap(), original);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn full_lifecycle_validates() {
    let chain = temp_chain();
    let examiner = SignerKeypair::generate();
    let evaluator = SignerKeypair::generate();
    let registrar = SignerKeypair::generate();

    chain
        .append_transactions(vec![upload_tx("script-1", "1RV21CS001")], "examiner-1", Some(&examiner))
        .unwrap();
    chain
        .append_transactions(vec![evaluation_tx("script-1", "1RV21CS001")], "evaluator-7", Some(&evaluator))
        .unwrap();
    let release = TransactionBuilder::new("")
        .semester("5")
        .academic_year("2025-26")
        .result_release(r#"[{"usn":"1RV21CS001","course_id":"CS101","grade":"A"}]"#)
        .signer("registrar")
        .build();
    chain
        .append_transactions(vec![release], "registrar", Some(&registrar))
        .unwrap();

    let ring = KeyRing::new()
        .with("examiner-1", examiner.public_key())
        .with("evaluator-7", evaluator.public_key())
        .with("registrar", registrar.public_key());

    let report = chain.validate(&ring).unwrap();
    assert!(!report.empty);
    assert_eq!(report.blocks_checked, 3);
    assert_eq!(report.transactions_checked, 3);

    let history = chain.script_history("SCRIPT-1").unwrap();
    let kinds: Vec<TxKind> = history.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![TxKind::Evaluation, TxKind::Upload]);
    assert_eq!(chain.result_releases("5", "2025-26").unwrap().len(), 1);
}

#[test]
fn fresh_store_validates_as_empty() {
    let chain = temp_chain();
    assert_eq!(chain.head().unwrap(), "");
    let report = chain.validate(&KeyRing::new()).unwrap();
    assert!(report.empty);
}

#[test]
fn corrupting_one_signature_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::at(dir.path().join("ledger.db"));
    let kp = SignerKeypair::generate();
    let ring = KeyRing::new().with("examiner-1", kp.public_key());

    let middle;
    {
        let chain = Chain::new(SledBlockStore::open(&config).unwrap());
        chain.append_transactions(vec![upload_tx("a", "u1")], "examiner-1", Some(&kp)).unwrap();
        middle = chain
            .append_transactions(vec![upload_tx("b", "u2")], "examiner-1", Some(&kp))
            .unwrap()
            .0;
        chain.append_transactions(vec![upload_tx("c", "u3")], "examiner-1", Some(&kp)).unwrap();
        assert!(chain.validate(&ring).is_ok());
    }

    // Flip a signature byte directly in the database file.
    {
        let db = sled::open(&config.path).unwrap();
        let blocks = db.open_tree("blocks").unwrap();
        let raw = blocks.get(middle.as_bytes()).unwrap().unwrap();
        let mut block: Block = serde_json::from_slice(&raw).unwrap();
        block.header.signature[10] ^= 0x01;
        blocks
            .insert(middle.as_bytes(), serde_json::to_vec(&block).unwrap())
            .unwrap();
        db.flush().unwrap();
    }

    let chain = Chain::new(SledBlockStore::open(&config).unwrap());
    let err = chain.validate(&ring).unwrap_err();
    assert!(matches!(err, LedgerError::Signature(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_writers_and_readers() {
    let chain = Arc::new(temp_chain());
    let kp = SignerKeypair::generate();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let chain = Arc::clone(&chain);
            let kp = kp.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    let tx = upload_tx(&format!("w{w}-s{i}"), "1RV21CS001");
                    chain.append_transactions(vec![tx], "examiner-1", Some(&kp)).unwrap();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || {
                for _ in 0..20 {
                    let head = chain.head().unwrap();
                    if !head.is_empty() {
                        // A head is only published after its block is stored.
                        chain.get_block(&head).unwrap();
                    }
                }
            })
        })
        .collect();

    for h in writers.into_iter().chain(readers) {
        h.join().unwrap();
    }

    let ring = KeyRing::new().with("examiner-1", kp.public_key());
    let report = chain.validate(&ring).unwrap();
    assert_eq!(report.blocks_checked, 40);
    assert_eq!(chain.chain_stats().unwrap().uploads, 40);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn chain_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::at(dir.path().join("ledger.db"));

    let head;
    {
        let chain = Chain::new(SledBlockStore::open(&config).unwrap());
        chain.append_transactions(vec![upload_tx("s1", "u1")], "svc", None).unwrap();
        head = chain
            .append_transactions(vec![upload_tx("s2", "u2")], "svc", None)
            .unwrap()
            .0;
    }

    let chain = Chain::new(SledBlockStore::open(&config).unwrap());
    assert_eq!(chain.head().unwrap(), head);
    assert_eq!(chain.iter(&head).count(), 2);
    let meta = chain.script_metadata("s2").unwrap();
    assert_eq!(meta.get("USN").map(String::as_str), Some("u2"));
}

#[test]
fn second_opener_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::at(dir.path().join("ledger.db"))
        .with_open_timeout(Duration::from_millis(100));
    let _holder = SledBlockStore::open(&config).unwrap();

    match SledBlockStore::open(&config) {
        Err(LedgerError::Storage { op, .. }) => assert_eq!(op, "open"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second open should fail while the lock is held"),
    }
}
