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

//! The storage engine (component C): a bounded, popularity-evicting record
//! store with an age-ordered refresh iterator.
//!
//! Popularity is tracked as a monotonically growing "virtual future
//! timestamp" rather than a hit counter, per the design this mirrors: a
//! `BinaryHeap` min-heap paired with a `HashMap` of authoritative scores
//! (the standard lazy-deletion priority queue idiom), since nothing in this
//! crate's dependency stack provides a ready-made priority-queue-with-lookup.
//! The age map is an [`indexmap::IndexMap`], which preserves insertion order
//! for O(1) keyed access and removal.

use crate::record::StorageKey;
use crate::validate;
use indexmap::IndexMap;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hard cap on entries, applied independently to `popularity` and `future_popularity`.
pub const DEFAULT_MAX_LEN: usize = 5000;
/// Popularity increment per interest event: the refresh TTL, 7 days in seconds.
pub const DEFAULT_STEP: u64 = 7 * 24 * 3600;

/// A source of the current time, injectable so tests can control aging
/// without sleeping.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// [`Clock`] backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Running counters surfaced to the metrics registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct StorageCounters {
    /// Entries evicted from the popularity queue.
    pub evicted_total: u64,
    /// Entries evicted from the future-popularity queue.
    pub future_evicted_total: u64,
    /// Puts rejected by the validator.
    pub rejected_total: u64,
}

/// The bounded, popularity-evicting record store.
pub struct Storage<C: Clock = SystemClock> {
    age_map: IndexMap<StorageKey, (u64, Vec<u8>)>,
    popularity_scores: HashMap<StorageKey, (u64, u64)>,
    popularity_heap: BinaryHeap<Reverse<(u64, u64, StorageKey)>>,
    future_popularity_scores: HashMap<StorageKey, (u64, u64)>,
    future_popularity_heap: BinaryHeap<Reverse<(u64, u64, StorageKey)>>,
    max_len: usize,
    step: u64,
    clock: C,
    counters: StorageCounters,
    seq_counter: u64,
}

impl Storage<SystemClock> {
    /// A storage engine with the default capacity and refresh TTL.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_LEN, DEFAULT_STEP, SystemClock)
    }
}

impl<C: Clock> Storage<C> {
    /// A storage engine with explicit capacity, step, and clock.
    pub fn new(max_len: usize, step: u64, clock: C) -> Self {
        Self {
            age_map: IndexMap::new(),
            popularity_scores: HashMap::new(),
            popularity_heap: BinaryHeap::new(),
            future_popularity_scores: HashMap::new(),
            future_popularity_heap: BinaryHeap::new(),
            max_len,
            step,
            clock,
            counters: StorageCounters::default(),
            seq_counter: 0,
        }
    }

    /// The next monotonic insertion sequence number, used to break
    /// equal-score ties in eviction order (see `set_popularity`,
    /// `set_future_popularity`).
    fn next_seq(&mut self) -> u64 {
        let seq = self.seq_counter;
        self.seq_counter += 1;
        seq
    }

    /// Current counters (for the metrics registry).
    pub fn counters(&self) -> StorageCounters {
        self.counters
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.age_map.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.age_map.is_empty()
    }

    /// Number of keys staged in the future-popularity queue.
    pub fn future_len(&self) -> usize {
        self.future_popularity_scores.len()
    }

    /// Validate and admit `value_bytes` at `storage_key`. Returns whether the
    /// record was admitted; a validation failure is a silent rejection (the
    /// caller may still log it) and bumps `rejected_total`.
    pub fn put(&mut self, storage_key: StorageKey, value_bytes: Vec<u8>) -> bool {
        let prior = self.age_map.get(&storage_key).map(|(_, v)| v.clone());
        match validate::validate(Some(&storage_key), &value_bytes, prior.as_deref()) {
            Ok(_) => {
                self.admit(storage_key, value_bytes);
                true
            }
            Err(_) => {
                self.counters.rejected_total += 1;
                false
            }
        }
    }

    fn admit(&mut self, key: StorageKey, value: Vec<u8>) {
        if let Some(entry) = self.age_map.get_mut(&key) {
            // Refresh: replace the value, keep the admission timestamp so age
            // iteration stays honest about how long this key has been held.
            entry.1 = value;
        } else {
            let now = self.clock.now_secs();
            self.age_map.insert(key, (now, value));
            let score = self.future_popularity_scores.remove(&key).map(|(s, _)| s).unwrap_or(now);
            self.set_popularity(key, score);
        }
        self.cull();
    }

    /// Push a popularity score for `key`, reusing its existing insertion
    /// sequence number if one was already assigned (a score bump), or
    /// minting a fresh one on first admission. Ties in the heap are broken
    /// by this sequence, not by `StorageKey`'s byte ordering.
    fn set_popularity(&mut self, key: StorageKey, score: u64) {
        let seq = self.popularity_scores.get(&key).map(|(_, seq)| *seq).unwrap_or_else(|| self.next_seq());
        self.popularity_scores.insert(key, (score, seq));
        self.popularity_heap.push(Reverse((score, seq, key)));
    }

    /// As `set_popularity`, for the future-popularity queue.
    fn set_future_popularity(&mut self, key: StorageKey, score: u64) {
        let seq = self.future_popularity_scores.get(&key).map(|(_, seq)| *seq).unwrap_or_else(|| self.next_seq());
        self.future_popularity_scores.insert(key, (score, seq));
        self.future_popularity_heap.push(Reverse((score, seq, key)));
    }

    /// Fetch the value at `storage_key`, bumping its popularity. Misses also
    /// bump `future_popularity` for the key, per the design's interest-bump
    /// semantics.
    pub fn get(&mut self, storage_key: &StorageKey) -> Option<Vec<u8>> {
        let value = self.age_map.get(storage_key).map(|(_, v)| v.clone());
        self.inc_popularity(*storage_key);
        value
    }

    fn inc_popularity(&mut self, key: StorageKey) {
        let now = self.clock.now_secs();
        if let Some(score) = self.popularity_scores.get(&key).map(|(s, _)| *s) {
            self.set_popularity(key, score + self.step);
        } else {
            let base = self.future_popularity_scores.get(&key).map(|(s, _)| *s).unwrap_or(now).max(now);
            let new_score = base + self.step;
            self.set_future_popularity(key, new_score);
        }
        self.cull();
    }

    /// Enforce `max_len` on both queues. A `while` loop, not an `if`: more
    /// than one entry may be over cap after a single admission.
    fn cull(&mut self) {
        while self.popularity_scores.len() > self.max_len {
            match Self::pop_valid(&mut self.popularity_heap, &self.popularity_scores) {
                Some((_, _, key)) => {
                    self.popularity_scores.remove(&key);
                    self.age_map.shift_remove(&key);
                    self.counters.evicted_total += 1;
                }
                None => break,
            }
        }
        while self.future_popularity_scores.len() > self.max_len {
            match Self::pop_valid(&mut self.future_popularity_heap, &self.future_popularity_scores) {
                Some((_, _, key)) => {
                    self.future_popularity_scores.remove(&key);
                    self.counters.future_evicted_total += 1;
                }
                None => break,
            }
        }
    }

    /// Pop the minimum-`(score, seq)` entry whose score and sequence still
    /// match the authoritative map (lazy deletion: stale heap entries, left
    /// behind by score bumps, are discarded here instead of on push). The
    /// sequence number, assigned once at first admission, breaks ties
    /// between equal scores by insertion order rather than by `StorageKey`.
    fn pop_valid(
        heap: &mut BinaryHeap<Reverse<(u64, u64, StorageKey)>>,
        scores: &HashMap<StorageKey, (u64, u64)>,
    ) -> Option<(u64, u64, StorageKey)> {
        while let Some(Reverse((score, seq, key))) = heap.pop() {
            if scores.get(&key) == Some(&(score, seq)) {
                return Some((score, seq, key));
            }
        }
        None
    }

    /// Records whose admission timestamp is at least `threshold_secs` in the
    /// past, oldest first. Stops at the first record younger than the
    /// threshold, since `age_map` is insertion-ordered.
    pub fn iter_items_older_than(&self, threshold_secs: u64) -> Vec<(StorageKey, Vec<u8>)> {
        let now = self.clock.now_secs();
        let mut out = Vec::new();
        for (key, (admitted_at, value)) in self.age_map.iter() {
            if now.saturating_sub(*admitted_at) >= threshold_secs {
                out.push((*key, value.clone()));
            } else {
                break;
            }
        }
        out
    }

    /// A full snapshot of held records, for replicating to new neighbors.
    pub fn iter_items(&self) -> Vec<(StorageKey, Vec<u8>)> {
        self.age_map.iter().map(|(k, (_, v))| (*k, v.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{self, Record};
    use proptest::prelude::*;
    use ring::signature::{Ed25519KeyPair, KeyPair};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FakeClock(AtomicU64);

    impl FakeClock {
        fn new(t: u64) -> Self {
            Self(AtomicU64::new(t))
        }
        fn set(&self, t: u64) {
            self.0.store(t, Ordering::SeqCst);
        }
    }

    impl Clock for FakeClock {
        fn now_secs(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn signed(seed: u8, name: &str, version: u64) -> (StorageKey, Vec<u8>) {
        let seed_bytes = [seed; 32];
        let kp = Ed25519KeyPair::from_seed_unchecked(&seed_bytes).unwrap();
        let key_bytes = kp.public_key().as_ref().to_vec();
        let fp = record::fingerprint(&key_bytes);
        let message = "https://example.org/";
        let plaintext = record::canonical_plaintext(name, message, version);
        let sig = kp.sign(&plaintext);
        let rec = Record {
            name: name.to_string(),
            message: message.to_string(),
            version,
            key: hex::encode(key_bytes),
            signature: hex::encode(sig.as_ref()),
        };
        let rec_key = record::record_key(name, &fp);
        (record::storage_key(&rec_key), record::encode(&rec))
    }

    #[test]
    fn s5_eviction_under_pressure() {
        let clock = FakeClock::new(1000);
        let mut storage = Storage::new(3, 10, clock);

        let (ka, va) = signed(1, "a", 0);
        let (kb, vb) = signed(2, "b", 0);
        let (kc, vc) = signed(3, "c", 0);
        let (kd, vd) = signed(4, "d", 0);
        let (ke, ve) = signed(5, "e", 0);

        assert!(storage.put(ka, va.clone()));
        assert!(storage.put(kb, vb.clone()));
        assert!(storage.put(kc, vc.clone()));

        assert!(storage.get(&ka).is_some());
        assert!(storage.get(&ka).is_some());
        assert!(storage.get(&ka).is_some());

        assert!(storage.put(kd, vd.clone()));
        assert_eq!(storage.len(), 3);
        assert!(storage.iter_items().iter().any(|(k, _)| *k == ka));
        assert!(!storage.iter_items().iter().any(|(k, _)| *k == kb));

        assert!(storage.put(ke, ve.clone()));
        assert_eq!(storage.len(), 3);
        assert!(!storage.iter_items().iter().any(|(k, _)| *k == kc));
        assert!(storage.iter_items().iter().any(|(k, _)| *k == ka));
        assert!(storage.iter_items().iter().any(|(k, _)| *k == kd));
        assert!(storage.iter_items().iter().any(|(k, _)| *k == ke));
    }

    #[test]
    fn p7_refresh_ordering() {
        let clock = FakeClock::new(1000);
        let mut storage = Storage::new(100, 10, clock);
        let (ka, va) = signed(1, "a", 0);
        storage.put(ka, va);
        let clock = &storage.clock;
        clock.set(1100);
        let (kb, vb) = signed(2, "b", 0);
        storage.put(kb, vb);

        let old = storage.iter_items_older_than(150);
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].0, ka);

        let none_old = storage.iter_items_older_than(10_000);
        assert!(none_old.is_empty());
    }

    #[test]
    fn refresh_keeps_admission_timestamp() {
        let clock = FakeClock::new(1000);
        let mut storage = Storage::new(100, 10, clock);
        let (key, v0) = signed(1, "a", 0);
        storage.put(key, v0);
        storage.clock.set(2000);
        let (_, v1) = signed(1, "a", 1);
        storage.put(key, v1.clone());

        assert_eq!(storage.get(&key).unwrap(), v1);
        // still "old" relative to the original admission time, not the refresh time
        let old = storage.iter_items_older_than(900);
        assert_eq!(old.len(), 1);
    }

    #[test]
    fn rejects_stale_put() {
        let clock = FakeClock::new(1000);
        let mut storage = Storage::new(100, 10, clock);
        let (key, v1) = signed(1, "a", 1);
        let (_, v0) = signed(1, "a", 0);
        storage.put(key, v1);
        assert!(!storage.put(key, v0));
        assert_eq!(storage.counters().rejected_total, 1);
    }

    fn arb_name() -> impl Strategy<Value = String> {
        "[a-z]{1,8}"
    }

    proptest! {
        #[test]
        fn p1_p2_p3_p4_admission_and_capacity_invariants(
            ops in prop::collection::vec((0u8..4, arb_name(), 0u64..50), 1..80)
        ) {
            let clock = FakeClock::new(1_000_000);
            let mut storage = Storage::new(8, 100, clock);
            let mut last_version: HashMap<String, u64> = HashMap::new();

            for (kind, name, version) in ops {
                match kind {
                    0 | 1 => {
                        let (key, bytes) = signed(1, &name, version);
                        let prior = last_version.get(&name).copied();
                        let admitted = storage.put(key, bytes.clone());
                        if admitted {
                            // P1: admitted value validates standalone against its own key.
                            prop_assert!(validate::validate(Some(&key), &bytes, None).is_ok());
                            if let Some(p) = prior {
                                // P2: strictly increasing per storage key.
                                prop_assert!(version > p);
                            }
                            last_version.insert(name.clone(), version);
                        } else if let Some(p) = prior {
                            prop_assert!(version <= p);
                        }
                    }
                    _ => {
                        let (key, _) = signed(1, &name, version);
                        let _ = storage.get(&key);
                    }
                }
                // P3: capacity bound after every operation.
                prop_assert!(storage.popularity_scores.len() <= storage.max_len);
                prop_assert!(storage.future_popularity_scores.len() <= storage.max_len);
                // P4: age_map and popularity share exactly the same key set at rest.
                prop_assert_eq!(storage.age_map.len(), storage.popularity_scores.len());
                for key in storage.age_map.keys() {
                    prop_assert!(storage.popularity_scores.contains_key(key));
                }
            }
        }
    }
}
