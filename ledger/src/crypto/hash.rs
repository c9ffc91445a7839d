// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Hashing Utilities
//!
//! SHA-256 is the only digest the ledger uses. Block keys, merkle roots and
//! the signed header digest all need to match blocks written by earlier
//! deployments, so there is no second hash function here.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data` as a fixed-size array.
///
/// # Example
///
/// ```
/// use exam_ledger::crypto::sha256;
///
/// let digest = sha256(b"exam ledger");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute SHA-256 and return the lowercase hex encoding (64 characters).
///
/// This is the textual form used for block keys and merkle roots.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Hash several byte slices as if they were concatenated, without building
/// the concatenation.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty string, from FIPS 180-2 test vectors.
    const EMPTY_DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_sha256_empty_vector() {
        assert_eq!(sha256_hex(b""), EMPTY_DIGEST);
    }

    #[test]
    fn test_sha256_abc_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_concat_matches_single_buffer() {
        let joined = sha256(b"headertransactions");
        let parts = sha256_concat(&[b"header".as_slice(), b"transactions".as_slice()]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_hex_is_lowercase_and_64_chars() {
        let h = sha256_hex(b"anything");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
