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

//! Prometheus metrics registry, exposed at `GET /metrics` on the gateway.
//! Purely operational — not part of the record protocol.

use crate::routing::StorageStats;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// The node's metrics registry and handles to its instruments.
pub struct Metrics {
    registry: Registry,
    records_stored: IntGauge,
    future_popularity_len: IntGauge,
    evictions_total: IntCounter,
    future_evictions_total: IntCounter,
    validation_rejected_total: IntCounter,
    gateway_requests_total: IntCounterVec,
    republish_success_total: IntCounter,
    republish_failure_total: IntCounter,
}

impl Metrics {
    /// Register every instrument against a fresh [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let records_stored = IntGauge::new("bizast_records_stored", "Records currently held").unwrap();
        let future_popularity_len = IntGauge::new(
            "bizast_future_popularity_len",
            "Keys staged in the future-popularity queue",
        )
        .unwrap();
        let evictions_total = IntCounter::new("bizast_evictions_total", "Records evicted from the popularity queue").unwrap();
        let future_evictions_total = IntCounter::new(
            "bizast_future_evictions_total",
            "Keys evicted from the future-popularity queue",
        )
        .unwrap();
        let validation_rejected_total = IntCounter::new(
            "bizast_validation_rejected_total",
            "Puts rejected by the validator",
        )
        .unwrap();
        let gateway_requests_total = IntCounterVec::new(
            Opts::new("bizast_gateway_requests_total", "HTTP requests served by the gateway"),
            &["method", "status"],
        )
        .unwrap();
        let republish_success_total =
            IntCounter::new("bizast_republish_success_total", "Republish attempts that succeeded").unwrap();
        let republish_failure_total =
            IntCounter::new("bizast_republish_failure_total", "Republish attempts that failed").unwrap();

        registry.register(Box::new(records_stored.clone())).unwrap();
        registry.register(Box::new(future_popularity_len.clone())).unwrap();
        registry.register(Box::new(evictions_total.clone())).unwrap();
        registry.register(Box::new(future_evictions_total.clone())).unwrap();
        registry.register(Box::new(validation_rejected_total.clone())).unwrap();
        registry.register(Box::new(gateway_requests_total.clone())).unwrap();
        registry.register(Box::new(republish_success_total.clone())).unwrap();
        registry.register(Box::new(republish_failure_total.clone())).unwrap();

        Self {
            registry,
            records_stored,
            future_popularity_len,
            evictions_total,
            future_evictions_total,
            validation_rejected_total,
            gateway_requests_total,
            republish_success_total,
            republish_failure_total,
        }
    }

    /// Refresh the gauges from a fresh [`StorageStats`] snapshot.
    pub fn observe_storage(&self, stats: StorageStats) {
        self.records_stored.set(stats.len as i64);
        self.future_popularity_len.set(stats.future_len as i64);

        let delta_evicted = stats.counters.evicted_total as i64 - self.evictions_total.get() as i64;
        if delta_evicted > 0 {
            self.evictions_total.inc_by(delta_evicted as u64);
        }
        let delta_future_evicted =
            stats.counters.future_evicted_total as i64 - self.future_evictions_total.get() as i64;
        if delta_future_evicted > 0 {
            self.future_evictions_total.inc_by(delta_future_evicted as u64);
        }
        let delta_rejected =
            stats.counters.rejected_total as i64 - self.validation_rejected_total.get() as i64;
        if delta_rejected > 0 {
            self.validation_rejected_total.inc_by(delta_rejected as u64);
        }
    }

    /// Record one gateway request.
    pub fn record_gateway_request(&self, method: &str, status: u16) {
        self.gateway_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
    }

    /// Record one republish outcome.
    pub fn record_republish(&self, success: bool) {
        if success {
            self.republish_success_total.inc();
        } else {
            self.republish_failure_total.inc();
        }
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let families = self.registry.gather();
        let encoder = TextEncoder::new();
        encoder.encode_to_string(&families).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
