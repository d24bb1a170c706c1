// Copyright (c) 2026 bizast contributors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Record codec & identity (component A): canonical serialization,
//! fingerprint derivation, and record/storage key parsing.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;

/// Maximum length, in bytes, of a record `name`.
pub const MAX_NAME_LEN: usize = 64;
/// Maximum length, in bytes, of a record `message`.
pub const MAX_MESSAGE_LEN: usize = 512;

/// The 20-byte SHA-1 digest used to index the storage engine and the DHT.
pub type StorageKey = [u8; 20];

/// Errors from decoding or parsing record identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Bytes do not decode to a well-formed record.
    #[error("malformed record")]
    Malformed,
    /// A `name:fingerprint` string does not split cleanly in two.
    #[error("invalid record key")]
    InvalidKey,
}

/// A signed resource record: `{name, message, version, key, signature}`.
///
/// `key` and `signature` are lower-hex strings (32 and 64 raw bytes,
/// respectively). They are validated for length and encoding by
/// [`crate::validate::validate`], not by this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Short name, scoped under the publisher's fingerprint.
    pub name: String,
    /// The message (typically a URI).
    pub message: String,
    /// Monotonic version for this (name, key) pair.
    pub version: u64,
    /// Publisher's Ed25519 verify key, lower-hex.
    pub key: String,
    /// Ed25519 signature over the canonical plaintext, lower-hex.
    pub signature: String,
}

/// Serialize a record to its transport JSON.
pub fn encode(record: &Record) -> Vec<u8> {
    // `Record`'s fields are all well-formed Rust types; this cannot fail.
    serde_json::to_vec(record).expect("record always serializes")
}

/// Parse transport JSON into a record.
///
/// Unknown fields are ignored (serde's default struct behavior). Decoding a
/// JSON value that isn't an object, or one missing a required field, fails.
pub fn decode(bytes: &[u8]) -> Result<Record, RecordError> {
    serde_json::from_slice(bytes).map_err(|_| RecordError::Malformed)
}

/// The exact bytes an Ed25519 signature is computed over: a JSON object with
/// exactly `{message, name, version}`, keys sorted lexicographically, no
/// insignificant whitespace. `serde_json::Map` is a `BTreeMap` by default (the
/// `preserve_order` feature is not enabled anywhere in this crate), so
/// building the object this way guarantees sorted keys regardless of the
/// order fields are inserted in below.
pub fn canonical_plaintext(name: &str, message: &str, version: u64) -> Vec<u8> {
    let mut map = serde_json::Map::new();
    map.insert("message".to_string(), serde_json::Value::String(message.to_string()));
    map.insert("name".to_string(), serde_json::Value::String(name.to_string()));
    map.insert("version".to_string(), serde_json::Value::Number(version.into()));
    serde_json::to_vec(&serde_json::Value::Object(map)).expect("canonical plaintext always serializes")
}

/// Lower-hex SHA-256 of a raw Ed25519 verify key.
pub fn fingerprint(verify_key_bytes: &[u8]) -> String {
    crate::crypto::sha256_hex(verify_key_bytes)
}

/// Build the user-visible `"<name>:<fingerprint>"` record key.
pub fn record_key(name: &str, fingerprint: &str) -> String {
    format!("{name}:{fingerprint}")
}

/// The 20-byte SHA-1 of a record key's UTF-8 bytes; this is the DHT/storage index.
pub fn storage_key(record_key: &str) -> StorageKey {
    let mut hasher = Sha1::new();
    hasher.update(record_key.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

/// Split `"name:fingerprint"` into its two halves.
///
/// Matches the original implementation's behavior exactly: the key is split
/// on every `:`, and exactly two non-empty parts must result. A `name`
/// containing a colon is therefore not representable — this is inherited,
/// intentional behavior, not an oversight.
pub fn parse_record_key(s: &str) -> Result<(String, String), RecordError> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(RecordError::InvalidKey);
    }
    let (name, fp) = (parts[0], parts[1]);
    if name.is_empty() || fp.is_empty() {
        return Err(RecordError::InvalidKey);
    }
    if fp.len() != 64 || !fp.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RecordError::InvalidKey);
    }
    Ok((name.to_string(), fp.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_plaintext_is_sorted_and_compact() {
        let bytes = canonical_plaintext("home", "https://example.org/", 0);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"message":"https://example.org/","name":"home","version":0}"#
        );
    }

    #[test]
    fn record_key_roundtrips_through_storage_key() {
        let key = "home:0123456789abcdef0123456789abcdef0123456789abcdef0123456789ab";
        let sk = storage_key(key);
        let (name, fp) = parse_record_key(key).unwrap();
        assert_eq!(record_key(&name, &fp), key);
        assert_eq!(storage_key(&record_key(&name, &fp)), sk);
    }

    #[test]
    fn parse_record_key_rejects_wrong_colon_count() {
        assert_eq!(parse_record_key("nocolon"), Err(RecordError::InvalidKey));
        assert_eq!(parse_record_key("a:b:c"), Err(RecordError::InvalidKey));
        assert_eq!(parse_record_key(":fponly"), Err(RecordError::InvalidKey));
    }

    #[test]
    fn parse_record_key_requires_64_hex_fingerprint() {
        assert_eq!(parse_record_key("home:abcd"), Err(RecordError::InvalidKey));
        let good_fp = "0".repeat(64);
        assert!(parse_record_key(&format!("home:{good_fp}")).is_ok());
    }

    #[test]
    fn decode_rejects_non_object_json() {
        assert_eq!(decode(b"[1,2,3]"), Err(RecordError::Malformed));
        assert_eq!(decode(b"\"just a string\""), Err(RecordError::Malformed));
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let raw = br#"{"name":"a","message":"b","version":1,"key":"k","signature":"s","extra":true}"#;
        let rec = decode(raw).unwrap();
        assert_eq!(rec.name, "a");
    }

    #[test]
    fn decode_rejects_missing_field() {
        let raw = br#"{"name":"a","message":"b","version":1,"key":"k"}"#;
        assert_eq!(decode(raw), Err(RecordError::Malformed));
    }
}
