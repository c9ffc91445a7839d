// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # CLI Interface
//!
//! Defines the command-line argument structure for `exam-ledger-node` using
//! `clap` derive. Every subcommand operates on one ledger database inside
//! the data directory; global flags select it.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Exam-script ledger operator tool.
///
/// Opens the ledger database in the data directory and appends, inspects,
/// queries, or validates the hash-linked chain of exam-script events.
#[derive(Parser, Debug)]
#[command(
    name = "exam-ledger-node",
    about = "Exam-script ledger operator tool",
    version,
    propagate_version = true
)]
pub struct ExamLedgerCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Data directory holding `ledger.db` and the `keys/` directory.
    #[arg(long, short = 'd', env = "EXAM_LEDGER_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Log output format.
    #[arg(long, env = "EXAM_LEDGER_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    pub log_format: LogFormatArg,

    /// How long to wait for another process to release the database lock.
    #[arg(long, env = "EXAM_LEDGER_OPEN_TIMEOUT_MS", default_value_t = 1000, global = true)]
    pub open_timeout_ms: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and database, and generate a signer keypair.
    Init(InitArgs),
    /// Append one block holding a single transaction, or every transaction
    /// in a JSON file.
    Append(AppendArgs),
    /// Print the head hash.
    Head,
    /// Print one block as JSON.
    Show(ShowArgs),
    /// List blocks from newest to oldest.
    Log(LogArgs),
    /// Validate the whole chain against the public keys in the keys directory.
    Verify(VerifyArgs),
    /// Look up a script's metadata or lifecycle history.
    Script(ScriptArgs),
    /// Print block and transaction counts.
    Stats,
    /// Print version information and exit.
    Version,
}

/// Arguments for `init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Signer id to generate a keypair for.
    #[arg(long, env = "EXAM_LEDGER_SIGNER")]
    pub signer: String,

    /// Replace an existing keypair for this signer.
    #[arg(long)]
    pub force: bool,
}

/// Which workflow event a transaction records.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Record,
    Upload,
    Evaluation,
    Release,
}

/// Arguments for `append`.
#[derive(Args, Debug)]
pub struct AppendArgs {
    /// Identity appending the block; also stamped on the transaction.
    #[arg(long, env = "EXAM_LEDGER_SIGNER")]
    pub signer: String,

    /// Append without signing the block header.
    #[arg(long)]
    pub unsigned: bool,

    /// JSON file with an array of transactions. Replaces the per-field flags.
    #[arg(long, conflicts_with_all = ["script_id", "usn", "course_id", "cid"])]
    pub file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = KindArg::Upload)]
    pub kind: KindArg,

    #[arg(long, default_value = "")]
    pub script_id: String,

    #[arg(long, default_value = "")]
    pub usn: String,

    #[arg(long, default_value = "")]
    pub course_id: String,

    #[arg(long, default_value = "")]
    pub semester: String,

    #[arg(long, default_value = "")]
    pub academic_year: String,

    #[arg(long, default_value_t = 0)]
    pub credits: i64,

    /// Content identifier of the scanned script.
    #[arg(long, default_value = "")]
    pub cid: String,

    /// Marks (evaluation) or result records (release), as a JSON string.
    #[arg(long)]
    pub payload: Option<String>,

    /// Extra metadata entries, `KEY=VALUE`. Repeatable.
    #[arg(long = "meta", value_parser = parse_key_val)]
    pub meta: Vec<(String, String)>,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Block hash. Defaults to the head.
    pub hash: Option<String>,
}

/// Arguments for `log`.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Start from this hash instead of the head.
    #[arg(long)]
    pub from: Option<String>,

    /// Stop after this many blocks.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Directory of `<signer>.pub` files. Defaults to `<data-dir>/keys`.
    #[arg(long, env = "EXAM_LEDGER_KEYS_DIR")]
    pub keys_dir: Option<PathBuf>,
}

/// Arguments for `script`.
#[derive(Args, Debug)]
pub struct ScriptArgs {
    pub script_id: String,

    /// Print every lifecycle event instead of the metadata.
    #[arg(long)]
    pub history: bool,
}

/// Parses `KEY=VALUE`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
