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

//! The validator (component B): the single predicate that decides whether a
//! candidate record is acceptable, standalone and relative to a prior
//! version. Every put — from the local gateway or from the DHT's network
//! inbox — runs through here. Nothing is trusted.

use crate::record::{self, Record, StorageKey, MAX_MESSAGE_LEN, MAX_NAME_LEN};
use crate::crypto;
use thiserror::Error;

/// Why a candidate record was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Invalid {
    /// The bytes don't decode to a record at all.
    #[error("record bytes do not decode")]
    Malformed,
    /// `name` or `message` is empty or exceeds its size limit.
    #[error("name or message exceed size limits")]
    Oversize,
    /// `key` or `signature` isn't valid hex of the expected length.
    #[error("key or signature has the wrong length")]
    BadEncoding,
    /// The record key derived from `name`/`key` doesn't hash to the expected storage key.
    #[error("record key does not hash to the expected storage key")]
    KeyMismatch,
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    Unauthorized,
    /// `version` is not strictly greater than the prior record's version.
    #[error("version is not strictly greater than the prior version")]
    Stale,
}

/// A record that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valid {
    /// The `name:fingerprint` record key.
    pub record_key: String,
    /// The publisher's fingerprint.
    pub fingerprint: String,
}

/// Validate a candidate record.
///
/// `expected_storage_key`, when given, guards against misrouted puts: the
/// record key derived from the candidate must hash to it. `prior_bytes`, when
/// given, is the record currently stored at this key; the candidate's
/// version must strictly exceed the prior's.
///
/// Checks run in this order and short-circuit on the first failure, matching
/// the order specified for this component.
pub fn validate(
    expected_storage_key: Option<&StorageKey>,
    candidate_bytes: &[u8],
    prior_bytes: Option<&[u8]>,
) -> Result<Valid, Invalid> {
    let candidate: Record = record::decode(candidate_bytes).map_err(|_| Invalid::Malformed)?;

    if candidate.name.is_empty()
        || candidate.name.len() > MAX_NAME_LEN
        || candidate.message.is_empty()
        || candidate.message.len() > MAX_MESSAGE_LEN
    {
        return Err(Invalid::Oversize);
    }

    let key_bytes = hex::decode(&candidate.key).map_err(|_| Invalid::BadEncoding)?;
    if key_bytes.len() != 32 {
        return Err(Invalid::BadEncoding);
    }
    let sig_bytes = hex::decode(&candidate.signature).map_err(|_| Invalid::BadEncoding)?;
    if sig_bytes.len() != 64 {
        return Err(Invalid::BadEncoding);
    }

    let fingerprint = record::fingerprint(&key_bytes);
    let rec_key = record::record_key(&candidate.name, &fingerprint);

    if let Some(expected) = expected_storage_key {
        let got = record::storage_key(&rec_key);
        if &got != expected {
            return Err(Invalid::KeyMismatch);
        }
    }

    let plaintext = record::canonical_plaintext(&candidate.name, &candidate.message, candidate.version);
    crypto::verify_ed25519(&key_bytes, &plaintext, &sig_bytes).map_err(|_| Invalid::Unauthorized)?;

    if let Some(prior) = prior_bytes {
        let prior: Record = record::decode(prior).map_err(|_| Invalid::Malformed)?;
        if prior.version >= candidate.version {
            return Err(Invalid::Stale);
        }
    }

    Ok(Valid { record_key: rec_key, fingerprint })
}
