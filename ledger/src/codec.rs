// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Canonical JSON Codec
//!
//! Content hashes are taken over JSON bytes, so the exact byte output of the
//! encoder is part of the ledger format. Two rules keep it stable:
//!
//! 1. **Field order** is the struct declaration order, and maps are
//!    `BTreeMap`s, so keys are sorted.
//! 2. **String escaping** matches the encoder the first ledger nodes were
//!    written with: `<`, `>`, `&`, U+2028 and U+2029 are emitted as `\uXXXX`
//!    escapes. Plain `serde_json` leaves them raw, which would silently change
//!    the hash of any block whose metadata contains e.g. `"A&B"`.
//!
//! Byte fields are stored base64 (standard alphabet, padded), and an empty
//! byte field is written as `null`.

use std::io;

use serde::de::{Deserialize, Deserializer};
use serde::Serialize;
use serde_json::ser::Formatter;

/// Compact JSON formatter with HTML-safe string escaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escape: &[u8] = match ch {
                '<' => b"\\u003c",
                '>' => b"\\u003e",
                '&' => b"\\u0026",
                '\u{2028}' => b"\\u2028",
                '\u{2029}' => b"\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escape)?;
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Encode `value` as canonical JSON bytes.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Deserialize `null` (or a missing field, with `#[serde(default)]`) as the
/// type's default value.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `#[serde(with = "base64_bytes")]` for `Vec<u8>` fields.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::de::{Deserialize, Deserializer, Error};
    use serde::Serializer;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        if bytes.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&STANDARD.encode(bytes))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Vec::new()),
            Some(s) => STANDARD.decode(s.as_bytes()).map_err(D::Error::custom),
        }
    }
}
