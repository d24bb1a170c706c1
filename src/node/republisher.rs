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

//! The republisher (component E): periodic re-publication of records this
//! node sponsors, on behalf of every entry in the node state's republish set.

use crate::monitoring::metrics::Metrics;
use crate::node::state::NodeState;
use crate::record;
use crate::routing::RoutingLayer;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, sleep, Duration};
use tracing::{info, warn};

/// Delay after boot before the first republish pass, giving the routing
/// layer time to populate its routing table.
pub const STARTUP_DELAY: Duration = Duration::from_secs(60);
/// Steady-state republish cadence.
pub const REPUBLISH_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Run the republish loop until cancelled: wait [`STARTUP_DELAY`], republish
/// once, then repeat every [`REPUBLISH_INTERVAL`].
pub async fn run(state: Arc<Mutex<NodeState>>, routing: Arc<dyn RoutingLayer>, metrics: Arc<Metrics>) {
    sleep(STARTUP_DELAY).await;
    let mut ticker = interval(REPUBLISH_INTERVAL);
    loop {
        republish_once(&state, routing.as_ref(), &metrics).await;
        ticker.tick().await;
    }
}

/// Re-issue `set` for every entry in the republish set. Best-effort: a
/// failure on one entry is logged and the next is attempted; this never
/// aborts the pass, and it never re-signs — the stored bytes are already signed.
pub async fn republish_once(state: &Arc<Mutex<NodeState>>, routing: &dyn RoutingLayer, metrics: &Metrics) {
    let entries: Vec<(String, String)> = {
        let guard = state.lock().await;
        guard.republish.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    };

    let mut ok = 0usize;
    let mut failed = 0usize;
    for (record_key, bytes) in entries {
        let storage_key = record::storage_key(&record_key);
        match routing.set(storage_key, bytes.into_bytes()).await {
            Ok(()) => {
                ok += 1;
                metrics.record_republish(true);
            }
            Err(err) => {
                failed += 1;
                metrics.record_republish(false);
                warn!(record_key = %record_key, error = %err, "republish failed, will retry next cycle");
            }
        }
    }
    info!(ok, failed, "republish pass complete");
}
