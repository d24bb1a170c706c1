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

//! Node state (component D): routing identity seed, bootstrap hints, and the
//! republish set, persisted as a single JSON document under the user cache
//! directory and replaced atomically on every save.

use crate::crypto;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

/// Default Kademlia bucket size, passed through to the (out-of-scope) routing layer.
pub const DEFAULT_KSIZE: u32 = 20;
/// Default Kademlia concurrency parameter, passed through to the routing layer.
pub const DEFAULT_ALPHA: u32 = 3;
/// How often durable state is flushed to disk.
pub const SAVE_INTERVAL: Duration = Duration::from_secs(60);

/// Failures loading or saving node state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The state file exists but isn't well-formed JSON.
    #[error("state file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Filesystem I/O failed.
    #[error("state I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A `[host, port]` bootstrap hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapHint {
    /// Hostname or address.
    pub host: String,
    /// Port.
    pub port: u16,
}

/// Durable per-node state: identity, bootstrap hints, and the republish set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// Kademlia bucket size (pass-through for the routing layer).
    pub ksize: u32,
    /// Kademlia concurrency parameter (pass-through for the routing layer).
    pub alpha: u32,
    /// The node's long-term routing identity seed, lower-hex.
    pub seed: String,
    /// Last-known reachable neighbors, for warm restart.
    pub bootstrap: Vec<BootstrapHint>,
    /// Record key → last-known signed record bytes (as a string) that this
    /// node sponsors and re-publishes.
    pub republish: IndexMap<String, String>,
}

impl NodeState {
    /// A fresh node identity: random seed, caller-supplied bootstrap hints, no
    /// sponsored records yet.
    pub fn fresh(bootstrap: Vec<BootstrapHint>) -> Self {
        let mut seed_bytes = [0u8; 32];
        crypto::fill_random(&mut seed_bytes);
        Self {
            ksize: DEFAULT_KSIZE,
            alpha: DEFAULT_ALPHA,
            seed: hex::encode(seed_bytes),
            bootstrap,
            republish: IndexMap::new(),
        }
    }

    /// Load state from `path`, or create and persist a fresh identity if the
    /// file does not exist yet.
    pub fn load_or_create(path: &Path, default_bootstrap: Vec<BootstrapHint>) -> Result<Self, StateError> {
        match std::fs::read(path) {
            Ok(bytes) => {
                let state: NodeState = serde_json::from_slice(&bytes)?;
                info!(path = %path.display(), "loaded node state");
                Ok(state)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let state = NodeState::fresh(default_bootstrap);
                state.save(path)?;
                info!(path = %path.display(), "created fresh node state");
                Ok(state)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Persist this state to `path`, atomically.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let bytes = serde_json::to_vec_pretty(self)?;
        crypto::atomic_write(path, &bytes)?;
        Ok(())
    }
}

/// The on-disk path for a given instance name: `<cache-dir>/<instance>/state.json`.
pub fn state_path(instance_name: &str) -> PathBuf {
    let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
    base.join(instance_name).join("state.json")
}

/// Run the 60-second save loop until cancelled. Save failures are logged and
/// retried on the next tick; in-memory state stays authoritative between saves.
pub async fn run_save_loop(state: Arc<Mutex<NodeState>>, path: PathBuf) {
    let mut ticker = interval(SAVE_INTERVAL);
    loop {
        ticker.tick().await;
        let snapshot = state.lock().await.clone();
        if let Err(err) = snapshot.save(&path) {
            warn!(error = %err, "failed to save node state, will retry next tick");
        }
    }
}
