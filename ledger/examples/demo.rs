// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Terminal walkthrough of one exam script's lifecycle on the ledger.
//!
//! Uploads a script, records its evaluation, releases the semester's
//! results, validates the chain, and then shows what a single flipped
//! signature byte does to validation.
//!
//! Run with:
//!   cargo run --example demo

use std::time::Instant;

use exam_ledger::{
    Block, BlockStore, Chain, KeyRing, SignerKeypair, SledBlockStore, TransactionBuilder,
};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}[{num}] {title}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn failure(text: &str) {
    println!("{RED}  [!!] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(16)]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("{BOLD}Exam ledger lifecycle demo{RESET}");

    let chain = Chain::new(SledBlockStore::open_temporary()?);
    let examiner = SignerKeypair::generate();
    let evaluator = SignerKeypair::generate();
    let registrar = SignerKeypair::generate();
    let ring = KeyRing::new()
        .with("examiner-1", examiner.public_key())
        .with("evaluator-7", evaluator.public_key())
        .with("registrar", registrar.public_key());

    // -- 1. Upload ----------------------------------------------------------
    section(1, "Examiner uploads the scanned script");
    let upload = TransactionBuilder::new("SCRIPT-2026-CS101-0042")
        .usn("1RV21CS042")
        .course("CS101", "5")
        .academic_year("2025-26")
        .credits(4)
        .cid("bafybeigdyrztxq5m3fa3nq4xa2a5c4k3lq6hdbq3j7tnd3rjk6ty2lz6xi")
        .meta("Exam Type", "SEE")
        .upload_record()
        .signer("examiner-1")
        .build();
    let (h1, _) = chain.append_transactions(vec![upload], "examiner-1", Some(&examiner))?;
    success("upload recorded");
    info("block", short(&h1));

    // -- 2. Evaluation ------------------------------------------------------
    section(2, "Evaluator records marks");
    let evaluation = TransactionBuilder::new("SCRIPT-2026-CS101-0042")
        .usn("1RV21CS042")
        .course("CS101", "5")
        .evaluation(r#"{"q1":9,"q2":7,"q3":10,"total":26}"#)
        .signer("evaluator-7")
        .build();
    let (h2, b2) = chain.append_transactions(vec![evaluation], "evaluator-7", Some(&evaluator))?;
    success("evaluation recorded");
    info("block", short(&h2));
    info("links to", short(&b2.header.prev_hash));

    // -- 3. Release ---------------------------------------------------------
    section(3, "Registrar releases semester results");
    let release = TransactionBuilder::new("")
        .semester("5")
        .academic_year("2025-26")
        .result_release(r#"[{"usn":"1RV21CS042","course_id":"CS101","grade":"A"}]"#)
        .signer("registrar")
        .build();
    let (h3, _) = chain.append_transactions(vec![release], "registrar", Some(&registrar))?;
    success("results released");
    info("head", short(&h3));

    // -- 4. Validate --------------------------------------------------------
    section(4, "Validate the chain");
    let start = Instant::now();
    let report = chain.validate(&ring)?;
    success(&format!(
        "{} blocks, {} transactions verified",
        report.blocks_checked, report.transactions_checked
    ));
    println!("{DIM}  [{:.2} ms]{RESET}", start.elapsed().as_secs_f64() * 1000.0);

    for event in chain.script_history("script-2026-cs101-0042")? {
        info(&event.kind.to_string(), short(&event.block_hash));
    }

    // -- 5. Tamper ----------------------------------------------------------
    section(5, "Flip one signature byte in the evaluation block");
    let mut forged: Block = chain.get_block(&h2)?;
    forged.header.signature[0] ^= 0x01;
    let tampered = Chain::new(exam_ledger::InMemoryBlockStore::new());
    let mut walk: Vec<_> = chain.iter(&h3).collect();
    walk.reverse();
    for stored in walk {
        let block = if stored.hash == h2 { forged.clone() } else { stored.block };
        tampered.store().commit_block(&stored.hash, &block)?;
    }
    match tampered.validate(&ring) {
        Ok(_) => success("tampering went unnoticed"),
        Err(e) => failure(&format!("validation rejected the copy: {e}")),
    }

    println!();
    Ok(())
}
