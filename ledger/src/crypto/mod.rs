// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Cryptographic Primitives
//!
//! Everything integrity-related in the ledger flows through here:
//!
//! - **SHA-256** for content hashes, merkle roots, and the header digest
//!   that gets signed. The on-disk format keys blocks by hex SHA-256, so this
//!   is not negotiable without a migration.
//! - **Ed25519** for header signatures and secondary transaction signatures.
//!
//! Everything here is a thin wrapper around audited implementations
//! (`sha2`, `ed25519-dalek`).

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{sha256, sha256_concat, sha256_hex};
pub use keys::{KeyError, SignerKeypair, SignerPublicKey};
pub use signatures::{sign_digest, verify_digest};
