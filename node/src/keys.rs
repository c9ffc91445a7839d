// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! Signer key files.
//!
//! Each signer has two files in the keys directory:
//!
//! ```text
//! <signer>.key   hex Ed25519 secret key, mode 0600
//! <signer>.pub   hex Ed25519 public key
//! ```
//!
//! `verify` builds its [`KeyRing`] from every `.pub` file it finds.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use exam_ledger::{KeyRing, SignerKeypair, SignerPublicKey};

const SECRET_EXT: &str = "key";
const PUBLIC_EXT: &str = "pub";

/// Signer ids become file names, so keep them to a safe alphabet.
fn check_signer_id(signer: &str) -> Result<()> {
    let ok = !signer.is_empty()
        && !signer.starts_with('.')
        && signer
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if !ok {
        bail!("invalid signer id `{signer}`: use letters, digits, '-', '_', '.', '@'");
    }
    Ok(())
}

pub fn secret_key_path(dir: &Path, signer: &str) -> PathBuf {
    dir.join(format!("{signer}.{SECRET_EXT}"))
}

pub fn public_key_path(dir: &Path, signer: &str) -> PathBuf {
    dir.join(format!("{signer}.{PUBLIC_EXT}"))
}

/// Writes both key files for `signer`. Refuses to replace an existing
/// secret key unless `force` is set.
pub fn write_keypair(dir: &Path, signer: &str, keypair: &SignerKeypair, force: bool) -> Result<PathBuf> {
    check_signer_id(signer)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create keys directory: {}", dir.display()))?;

    let secret_path = secret_key_path(dir, signer);
    if secret_path.exists() && !force {
        bail!(
            "a key for `{signer}` already exists at {} (use --force to replace it)",
            secret_path.display()
        );
    }
    fs::write(&secret_path, keypair.secret_key_hex())
        .with_context(|| format!("failed to write secret key to {}", secret_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&secret_path, fs::Permissions::from_mode(0o600))?;
    }

    let public_path = public_key_path(dir, signer);
    fs::write(&public_path, keypair.public_key().to_hex())
        .with_context(|| format!("failed to write public key to {}", public_path.display()))?;
    Ok(secret_path)
}

/// Loads the secret key of `signer`.
pub fn load_keypair(dir: &Path, signer: &str) -> Result<SignerKeypair> {
    check_signer_id(signer)?;
    let path = secret_key_path(dir, signer);
    let hex = fs::read_to_string(&path)
        .with_context(|| format!("no secret key for `{signer}` at {}", path.display()))?;
    SignerKeypair::from_hex(&hex).with_context(|| format!("malformed secret key in {}", path.display()))
}

/// Loads every `<signer>.pub` in `dir` into a key ring.
pub fn load_key_ring(dir: &Path) -> Result<KeyRing> {
    let mut ring = KeyRing::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read keys directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(PUBLIC_EXT) {
            continue;
        }
        let Some(signer) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let hex = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let key = SignerPublicKey::from_hex(hex.trim())
            .with_context(|| format!("malformed public key in {}", path.display()))?;
        ring.insert(signer, key);
    }
    Ok(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let kp = SignerKeypair::generate();
        write_keypair(dir.path(), "examiner-1", &kp, false).unwrap();

        let loaded = load_keypair(dir.path(), "examiner-1").unwrap();
        assert_eq!(loaded.public_key(), kp.public_key());

        let ring = load_key_ring(dir.path()).unwrap();
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.get("examiner-1"), Some(&kp.public_key()));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let first = SignerKeypair::generate();
        write_keypair(dir.path(), "svc", &first, false).unwrap();
        assert!(write_keypair(dir.path(), "svc", &SignerKeypair::generate(), false).is_err());

        let second = SignerKeypair::generate();
        write_keypair(dir.path(), "svc", &second, true).unwrap();
        assert_eq!(load_keypair(dir.path(), "svc").unwrap().public_key(), second.public_key());
    }

    #[test]
    fn rejects_path_like_signer_ids() {
        let dir = tempfile::tempdir().unwrap();
        let kp = SignerKeypair::generate();
        assert!(write_keypair(dir.path(), "../evil", &kp, false).is_err());
        assert!(write_keypair(dir.path(), "", &kp, false).is_err());
        assert!(load_keypair(dir.path(), ".hidden").is_err());
    }

    #[test]
    fn ring_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README"), "not a key").unwrap();
        write_keypair(dir.path(), "a", &SignerKeypair::generate(), false).unwrap();
        assert_eq!(load_key_ring(dir.path()).unwrap().signers(), vec!["a"]);
    }
}
