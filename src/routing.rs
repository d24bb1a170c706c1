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

//! The contract the (out-of-scope) Kademlia routing layer exposes to the
//! storage engine, gateway, and republisher, plus the one implementation
//! this crate ships: [`LocalRoutingLayer`], which answers directly against an
//! in-process [`Storage`]. There is no k-bucket maintenance, no iterative
//! FIND_NODE/FIND_VALUE, no UDP wire format here — a real network-backed
//! implementation of this trait is a separate, later concern.

use crate::record::StorageKey;
use crate::storage::{Storage, StorageCounters};
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Routing-layer failures.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The network-facing operation found no reachable peers (never produced
    /// by [`LocalRoutingLayer`], which cannot fail this way).
    #[error("no reachable peers")]
    Unreachable,
}

/// Point-in-time counters surfaced by a routing layer, for the metrics registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct StorageStats {
    /// Records currently held.
    pub len: usize,
    /// Keys staged in the future-popularity queue.
    pub future_len: usize,
    /// Storage engine counters.
    pub counters: StorageCounters,
}

/// The DHT routing layer's interface, as consumed by the storage engine,
/// gateway, and republisher. A real implementation maintains k-buckets and
/// performs iterative network lookups; this trait only commits to the shape
/// those callers need.
pub trait RoutingLayer: Send + Sync {
    /// Look up `storage_key`, locally or over the network.
    fn get(&self, storage_key: StorageKey) -> BoxFuture<'_, Result<Option<Vec<u8>>, RoutingError>>;
    /// Publish `value` at `storage_key`, locally or over the network.
    fn set(&self, storage_key: StorageKey, value: Vec<u8>) -> BoxFuture<'_, Result<(), RoutingError>>;
    /// Snapshot of storage-engine counters, for `/metrics`.
    fn stats(&self) -> BoxFuture<'_, StorageStats>;
}

/// The stand-in routing layer: answers `get`/`set` directly against an
/// in-process [`Storage`], with no network hop. This is what lets the node
/// run end-to-end — gateway, validator, storage, republisher, durable state
/// all wired together — without a real Kademlia wire protocol.
pub struct LocalRoutingLayer {
    storage: Arc<Mutex<Storage>>,
}

impl LocalRoutingLayer {
    /// Wrap an existing, shared storage engine.
    pub fn new(storage: Arc<Mutex<Storage>>) -> Self {
        Self { storage }
    }
}

impl RoutingLayer for LocalRoutingLayer {
    fn get(&self, storage_key: StorageKey) -> BoxFuture<'_, Result<Option<Vec<u8>>, RoutingError>> {
        Box::pin(async move {
            let mut storage = self.storage.lock().await;
            Ok(storage.get(&storage_key))
        })
    }

    fn set(&self, storage_key: StorageKey, value: Vec<u8>) -> BoxFuture<'_, Result<(), RoutingError>> {
        Box::pin(async move {
            let mut storage = self.storage.lock().await;
            storage.put(storage_key, value);
            Ok(())
        })
    }

    fn stats(&self) -> BoxFuture<'_, StorageStats> {
        Box::pin(async move {
            let storage = self.storage.lock().await;
            StorageStats {
                len: storage.len(),
                future_len: storage.future_len(),
                counters: storage.counters(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{self, Record};
    use ring::signature::{Ed25519KeyPair, KeyPair};

    fn signed_bytes() -> (StorageKey, Vec<u8>) {
        let seed = [7u8; 32];
        let kp = Ed25519KeyPair::from_seed_unchecked(&seed).unwrap();
        let key_bytes = kp.public_key().as_ref().to_vec();
        let fp = record::fingerprint(&key_bytes);
        let plaintext = record::canonical_plaintext("home", "https://example.org/", 0);
        let sig = kp.sign(&plaintext);
        let rec = Record {
            name: "home".to_string(),
            message: "https://example.org/".to_string(),
            version: 0,
            key: hex::encode(key_bytes),
            signature: hex::encode(sig.as_ref()),
        };
        let rec_key = record::record_key("home", &fp);
        (record::storage_key(&rec_key), record::encode(&rec))
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let storage = Arc::new(Mutex::new(Storage::with_defaults()));
        let layer = LocalRoutingLayer::new(storage);
        let (key, bytes) = signed_bytes();

        layer.set(key, bytes.clone()).await.unwrap();
        let got = layer.get(key).await.unwrap();
        assert_eq!(got, Some(bytes));

        let stats = layer.stats().await;
        assert_eq!(stats.len, 1);
    }

    #[tokio::test]
    async fn get_miss_returns_none() {
        let storage = Arc::new(Mutex::new(Storage::with_defaults()));
        let layer = LocalRoutingLayer::new(storage);
        assert_eq!(layer.get([0u8; 20]).await.unwrap(), None);
    }
}
