// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Exam Ledger Node
//!
//! Entry point for the `exam-ledger-node` binary. Parses CLI arguments,
//! initializes logging, opens the ledger in the data directory, and runs one
//! subcommand:
//!
//! - `init`    : create the database and a signer keypair
//! - `append`  : append a block of transactions on top of the head
//! - `head`    : print the head hash
//! - `show`    : print a block as JSON
//! - `log`     : list blocks newest to oldest
//! - `verify`  : validate the chain against known signer keys
//! - `script`  : script metadata or lifecycle history
//! - `stats`   : block and transaction counts
//! - `version` : print build version information

mod cli;
mod keys;
mod logging;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

use exam_ledger::transaction::validate_transaction;
use exam_ledger::{Chain, LedgerConfig, SledBlockStore, StoredBlock, Transaction, TransactionBuilder};

use cli::{Commands, ExamLedgerCli, GlobalArgs, KindArg};

/// File name of the database inside the data directory.
const DB_FILE: &str = "ledger.db";
/// Directory of signer key files inside the data directory.
const KEYS_DIR: &str = "keys";

fn main() -> Result<()> {
    let cli = ExamLedgerCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.global.log_format.into());

    match cli.command {
        Commands::Init(args) => init_ledger(&cli.global, args),
        Commands::Append(args) => append(&cli.global, args),
        Commands::Head => print_head(&cli.global),
        Commands::Show(args) => show_block(&cli.global, args),
        Commands::Log(args) => print_log(&cli.global, args),
        Commands::Verify(args) => verify_chain(&cli.global, args),
        Commands::Script(args) => script(&cli.global, args),
        Commands::Stats => print_stats(&cli.global),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ledger_config(global: &GlobalArgs) -> LedgerConfig {
    LedgerConfig::at(global.data_dir.join(DB_FILE))
        .with_open_timeout(Duration::from_millis(global.open_timeout_ms))
}

fn keys_dir(global: &GlobalArgs) -> PathBuf {
    global.data_dir.join(KEYS_DIR)
}

fn open_chain(global: &GlobalArgs) -> Result<Chain<SledBlockStore>> {
    let config = ledger_config(global);
    let store = SledBlockStore::open(&config)
        .with_context(|| format!("failed to open ledger at {}", config.path.display()))?;
    Ok(Chain::new(store))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

/// Creates the data directory and database and generates a signer keypair.
fn init_ledger(global: &GlobalArgs, args: cli::InitArgs) -> Result<()> {
    let data_dir = &global.data_dir;
    tracing::info!(data_dir = %data_dir.display(), signer = %args.signer, "initializing ledger");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
    let chain = open_chain(global)?;
    chain.flush()?;

    let keypair = exam_ledger::SignerKeypair::generate();
    let key_path = keys::write_keypair(&keys_dir(global), &args.signer, &keypair, args.force)?;

    tracing::info!(
        public_key = %keypair.public_key().to_hex(),
        key_path = %key_path.display(),
        "signer keypair generated"
    );

    println!("Ledger initialized.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Head           : {}", display_head(&chain.head()?));
    println!("  Signer         : {}", args.signer);
    println!("  Secret key     : {}", key_path.display());
    println!("  Public key     : {}", keypair.public_key().to_hex());
    Ok(())
}

/// Builds the single transaction described by the `append` flags.
fn transaction_from_args(args: &cli::AppendArgs) -> Result<Transaction> {
    let mut builder = TransactionBuilder::new(args.script_id.trim())
        .usn(args.usn.trim())
        .course(args.course_id.trim(), args.semester.trim())
        .academic_year(args.academic_year.trim())
        .credits(args.credits)
        .cid(args.cid.trim())
        .extend_meta(args.meta.iter().cloned())
        .signer(args.signer.as_str());

    builder = match (args.kind, args.payload.as_deref()) {
        (KindArg::Record, _) => builder,
        (KindArg::Upload, _) => builder.upload_record(),
        (KindArg::Evaluation, Some(marks)) => builder.evaluation(marks),
        (KindArg::Release, Some(records)) => builder.result_release(records),
        (kind, None) => bail!("--payload is required for --kind {kind:?}"),
    };
    Ok(builder.build())
}

fn read_transactions(path: &Path, signer: &str) -> Result<Vec<Transaction>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut txs: Vec<Transaction> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of transactions", path.display()))?;
    let now = chrono::Utc::now().timestamp();
    for tx in &mut txs {
        if tx.signer_id.is_empty() {
            tx.signer_id = signer.to_string();
        }
        if tx.created_at == 0 {
            tx.created_at = now;
        }
    }
    Ok(txs)
}

/// Appends one block on top of the current head.
fn append(global: &GlobalArgs, args: cli::AppendArgs) -> Result<()> {
    let txs = match &args.file {
        Some(path) => read_transactions(path, &args.signer)?,
        None => vec![transaction_from_args(&args)?],
    };
    if txs.is_empty() {
        bail!("nothing to append");
    }
    for (i, tx) in txs.iter().enumerate() {
        validate_transaction(tx).with_context(|| format!("transaction {i} rejected"))?;
    }

    let keypair = if args.unsigned {
        None
    } else {
        Some(keys::load_keypair(&keys_dir(global), &args.signer)?)
    };

    let chain = open_chain(global)?;
    let (hash, block) = chain
        .append_transactions(txs, &args.signer, keypair.as_ref())
        .context("append failed")?;

    tracing::info!(
        hash = %hash,
        prev = %block.header.prev_hash,
        txs = block.transactions.len(),
        signed = block.header.is_signed(),
        "block appended"
    );
    println!("{hash}");
    Ok(())
}

fn display_head(head: &str) -> &str {
    if head.is_empty() {
        "(empty)"
    } else {
        head
    }
}

fn print_head(global: &GlobalArgs) -> Result<()> {
    let chain = open_chain(global)?;
    println!("{}", display_head(&chain.head()?));
    Ok(())
}

fn show_block(global: &GlobalArgs, args: cli::ShowArgs) -> Result<()> {
    let chain = open_chain(global)?;
    let stored = match args.hash {
        Some(hash) => {
            let block = chain
                .get_block(&hash)
                .with_context(|| format!("cannot show block {hash}"))?;
            StoredBlock { hash, block }
        }
        None => chain.head_block()?.context("the ledger is empty")?,
    };
    print_json(&serde_json::json!({ "hash": stored.hash, "block": stored.block }))
}

fn print_log(global: &GlobalArgs, args: cli::LogArgs) -> Result<()> {
    let chain = open_chain(global)?;
    let start = match args.from {
        Some(h) => h,
        None => chain.head()?,
    };
    let limit = args.limit.unwrap_or(usize::MAX);

    let mut cursor = chain.iter(&start);
    for stored in cursor.by_ref().take(limit) {
        let header = &stored.block.header;
        let kinds: Vec<String> = stored
            .block
            .transactions
            .iter()
            .map(|tx| tx.kind().to_string())
            .collect();
        println!(
            "{}  {}  {:<16} {:>3} tx  [{}]{}",
            stored.hash,
            format_timestamp(header.timestamp),
            header.signer_id,
            stored.block.transactions.len(),
            kinds.join(","),
            if header.is_signed() { "" } else { "  unsigned" },
        );
    }
    if let Some(missing) = cursor.missing() {
        println!("(chain ends at missing block {missing})");
    }
    match cursor.into_err() {
        Some(e) => Err(anyhow::Error::new(e).context("log walk failed")),
        None => Ok(()),
    }
}

fn verify_chain(global: &GlobalArgs, args: cli::VerifyArgs) -> Result<()> {
    let dir = args.keys_dir.unwrap_or_else(|| keys_dir(global));
    let ring = keys::load_key_ring(&dir)?;
    tracing::info!(signers = ?ring.signers(), "loaded signer keys");

    let chain = open_chain(global)?;
    let report = chain.validate(&ring).context("chain validation failed")?;
    if report.empty {
        println!("Ledger is empty; nothing to verify.");
    } else {
        println!("Chain OK.");
        println!("  Head         : {}", report.head);
        println!("  Blocks       : {}", report.blocks_checked);
        println!("  Transactions : {}", report.transactions_checked);
    }
    Ok(())
}

fn script(global: &GlobalArgs, args: cli::ScriptArgs) -> Result<()> {
    let chain = open_chain(global)?;
    if args.history {
        let events = chain.script_history(&args.script_id)?;
        if events.is_empty() {
            bail!("no events for script {}", args.script_id.trim());
        }
        print_json(&events)
    } else {
        let meta = chain.script_metadata(&args.script_id)?;
        print_json(&meta)
    }
}

fn print_stats(global: &GlobalArgs) -> Result<()> {
    let chain = open_chain(global)?;
    let stats = chain.chain_stats()?;
    let size_on_disk = chain.store().size_on_disk()?;
    print_json(&serde_json::json!({ "stats": stats, "size_on_disk": size_on_disk }))
}

/// Prints version information to stdout.
fn print_version() {
    println!("exam-ledger-node {}", env!("CARGO_PKG_VERSION"));
    println!("hash      {}", exam_ledger::config::HASH_ALGORITHM);
    println!("signature {}", exam_ledger::config::SIGNATURE_ALGORITHM);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(dir: &std::path::Path) -> GlobalArgs {
        GlobalArgs {
            data_dir: dir.to_path_buf(),
            log_format: cli::LogFormatArg::Pretty,
            open_timeout_ms: 1000,
        }
    }

    fn append_args(signer: &str, script: &str) -> cli::AppendArgs {
        cli::AppendArgs {
            signer: signer.to_string(),
            unsigned: false,
            file: None,
            kind: KindArg::Upload,
            script_id: script.to_string(),
            usn: "1RV21CS001".into(),
            course_id: "CS101".into(),
            semester: "5".into(),
            academic_year: "2025-26".into(),
            credits: 4,
            cid: "bafy".into(),
            payload: None,
            meta: vec![("USN".into(), "1RV21CS001".into())],
        }
    }

    #[test]
    fn init_append_verify() {
        let dir = tempfile::tempdir().unwrap();
        let g = global(dir.path());
        init_ledger(&g, cli::InitArgs { signer: "examiner-1".into(), force: false }).unwrap();
        append(&g, append_args("examiner-1", "s1")).unwrap();
        append(&g, append_args("examiner-1", "s2")).unwrap();
        verify_chain(&g, cli::VerifyArgs { keys_dir: None }).unwrap();

        let chain = open_chain(&g).unwrap();
        assert_eq!(chain.iter_from_head().unwrap().count(), 2);
    }

    #[test]
    fn show_and_stats_read_the_head() {
        let dir = tempfile::tempdir().unwrap();
        let g = global(dir.path());
        assert!(show_block(&g, cli::ShowArgs { hash: None }).is_err());

        let mut args = append_args("svc", "s1");
        args.unsigned = true;
        append(&g, args).unwrap();
        show_block(&g, cli::ShowArgs { hash: None }).unwrap();
        assert!(show_block(&g, cli::ShowArgs { hash: Some("feed".into()) }).is_err());
        print_stats(&g).unwrap();
    }

    #[test]
    fn append_rejects_incomplete_record() {
        let dir = tempfile::tempdir().unwrap();
        let g = global(dir.path());
        let mut args = append_args("svc", "s1");
        args.unsigned = true;
        args.cid.clear();
        assert!(append(&g, args).is_err());
    }

    #[test]
    fn evaluation_requires_payload() {
        let mut args = append_args("svc", "s1");
        args.kind = KindArg::Evaluation;
        assert!(transaction_from_args(&args).is_err());
        args.payload = Some(r#"{"q1":5}"#.into());
        let tx = transaction_from_args(&args).unwrap();
        assert_eq!(tx.kind(), exam_ledger::TxKind::Evaluation);
    }

    #[test]
    fn append_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let g = global(dir.path());
        let file = dir.path().join("txs.json");
        std::fs::write(
            &file,
            r#"[{"script_id":"s1","usn":"u1","course_id":"CS101","semester":"5","cid":"c1"},
                {"script_id":"s2","usn":"u2","course_id":"CS101","semester":"5","cid":"c2"}]"#,
        )
        .unwrap();
        let mut args = append_args("svc", "");
        args.unsigned = true;
        args.file = Some(file);
        append(&g, args).unwrap();

        let chain = open_chain(&g).unwrap();
        let head = chain.head().unwrap();
        let block = chain.get_block(&head).unwrap();
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0].signer_id, "svc");
        assert!(block.transactions[0].created_at > 0);
    }

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
    }
}
