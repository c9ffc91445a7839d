// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ledger Configuration & Constants
//!
//! Every on-disk name and tunable the ledger depends on lives here. The tree
//! names and the head key are part of the persisted format: changing them
//! orphans every existing database, so treat them as frozen.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Persisted Layout
// ---------------------------------------------------------------------------

/// sled tree holding `hex(sha256)` block hashes → JSON-encoded blocks.
pub const TREE_BLOCKS: &str = "blocks";

/// sled tree holding chain metadata (currently only the head pointer).
pub const TREE_CHAIN_META: &str = "chain_meta";

/// Key in [`TREE_CHAIN_META`] whose value is the raw head-hash bytes.
pub const HEAD_KEY: &[u8] = b"head";

// ---------------------------------------------------------------------------
// Transaction Meta Namespaces
// ---------------------------------------------------------------------------

/// Marks a transaction as the original script upload record.
pub const META_UPLOAD_RECORD: &str = "_upload_record";

/// Holds the JSON-encoded marks of an evaluation.
pub const META_EVALUATION: &str = "_evaluation";

/// Holds the JSON-encoded aggregate of a result release.
pub const META_RESULT_RELEASE: &str = "_result_release";

/// Key added to script metadata query results, pointing at the stored PDF.
pub const META_PDF_CID: &str = "pdf_cid";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Digest used for content hashes, merkle roots and the signed header digest.
pub const HASH_ALGORITHM: &str = "SHA-256";

/// Header signature scheme.
pub const SIGNATURE_ALGORITHM: &str = "Ed25519";

// ---------------------------------------------------------------------------
// Storage Defaults
// ---------------------------------------------------------------------------

/// Default database location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/ledger.db";

/// How long `open` keeps retrying while another process holds the file lock.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(1);

/// Back-off between lock acquisition attempts during `open`.
pub const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for opening a ledger database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Filesystem path of the sled database directory.
    pub path: PathBuf,
    /// Upper bound on waiting for another holder to release the file lock.
    /// Zero means a single attempt.
    pub open_timeout: Duration,
    /// Flush to disk after every committed block.
    pub flush_on_append: bool,
    /// Open a throwaway database that is deleted on drop (tests, dry runs).
    pub temporary: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            flush_on_append: true,
            temporary: false,
        }
    }
}

impl LedgerConfig {
    /// Config for a persistent database at `path` with all other defaults.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Overrides the lock acquisition timeout.
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_persistent_and_flushing() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(cfg.open_timeout, DEFAULT_OPEN_TIMEOUT);
        assert!(cfg.flush_on_append);
        assert!(!cfg.temporary);
    }

    #[test]
    fn at_overrides_only_the_path() {
        let cfg = LedgerConfig::at("/tmp/x").with_open_timeout(Duration::ZERO);
        assert_eq!(cfg.path, PathBuf::from("/tmp/x"));
        assert_eq!(cfg.open_timeout, Duration::ZERO);
        assert!(cfg.flush_on_append);
    }
}
