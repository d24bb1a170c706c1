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

//! Shared cryptographic primitives and the atomic-file-write idiom used by
//! every piece of durable state in this node.

use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{self, UnparsedPublicKey};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Crypto errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Ed25519 verification failed.
    #[error("signature verification failed")]
    BadSignature,
}

/// Lower-hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, bytes);
    hex::encode(digest.as_ref())
}

/// Verify an Ed25519 signature. `public_key` and `signature` are raw bytes
/// (32 and 64 bytes respectively); callers are responsible for checking
/// lengths before calling this, since a wrong-length key or signature is a
/// distinct validation failure (`BadEncoding`) from a bad signature.
pub fn verify_ed25519(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let pk = UnparsedPublicKey::new(&signature::ED25519, public_key);
    pk.verify(message, signature).map_err(|_| CryptoError::BadSignature)
}

/// Fill `out` with cryptographically secure random bytes.
pub fn fill_random(out: &mut [u8]) {
    let rng = SystemRandom::new();
    // SystemRandom only fails if the OS RNG is unavailable, which is fatal
    // for a process that needs a routing identity at all.
    rng.fill(out).expect("system RNG unavailable");
}

/// Atomically replace `path`'s contents: write to a sibling `<name>.1`, fsync,
/// then rename over `path`. A reader never observes a partially written file.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("state.json");
    let mut tmp = path.to_path_buf();
    tmp.set_file_name(format!("{file_name}.1"));

    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::{Ed25519KeyPair, KeyPair};

    #[test]
    fn verify_ed25519_roundtrip() {
        let seed = [0u8; 32];
        let kp = Ed25519KeyPair::from_seed_unchecked(&seed).unwrap();
        let msg = b"hello world";
        let sig = kp.sign(msg);
        assert!(verify_ed25519(kp.public_key().as_ref(), msg, sig.as_ref()).is_ok());
        assert!(verify_ed25519(kp.public_key().as_ref(), b"tampered", sig.as_ref()).is_err());
    }

    #[test]
    fn atomic_write_replaces_file_without_partial_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        atomic_write(&path, b"{\"a\":1}").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{\"a\":1}");
        atomic_write(&path, b"{\"a\":2}").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{\"a\":2}");
        assert!(!dir.path().join("state.json.1").exists());
    }
}
