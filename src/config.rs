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

//! The operator-facing CLI surface (component G), parsed with `clap`'s
//! derive API. Every flag also accepts a `BIZAST_*` environment override; an
//! explicit CLI flag wins when both are given.

use crate::node::state::BootstrapHint;
use clap::Parser;

/// Well-known default bootstrap seed, matching the legacy CLI default.
const DEFAULT_BOOTSTRAP: &str = "soyvindication.dyndns.org:26282";

/// `bizast` — a peer-to-peer naming service node.
#[derive(Parser, Debug)]
#[command(name = "bizast", version, about = "Signed-record naming service over a Kademlia-style DHT")]
pub struct Cli {
    /// UDP port the (out-of-scope) DHT routing layer listens on.
    #[arg(long, env = "BIZAST_DHTPORT", default_value_t = 26282)]
    pub dhtport: u16,

    /// TCP port the HTTP gateway listens on.
    #[arg(long, env = "BIZAST_WEBPORT", default_value_t = 62341)]
    pub webport: u16,

    /// Bootstrap peer as `host:port`; may be repeated.
    #[arg(long, env = "BIZAST_BOOTSTRAP", value_delimiter = ',', default_value = "soyvindication.dyndns.org:26282")]
    pub bootstrap: Vec<String>,

    /// Namespaces the state directory under the user cache directory.
    #[arg(long, env = "BIZAST_INSTANCENAME", default_value = "bizast")]
    pub instancename: String,

    /// Enable verbose (debug-level) logging.
    #[arg(long, env = "BIZAST_VERBOSE")]
    pub verbose: bool,
}

impl Cli {
    /// Parse `--bootstrap` entries into `(host, port)` hints, skipping any
    /// entry that doesn't parse cleanly. Used to seed a fresh [`crate::node::state::NodeState`].
    pub fn bootstrap_hints(&self) -> Vec<BootstrapHint> {
        self.bootstrap
            .iter()
            .filter_map(|entry| {
                let (host, port) = entry.rsplit_once(':')?;
                let port: u16 = port.parse().ok()?;
                Some(BootstrapHint { host: host.to_string(), port })
            })
            .collect()
    }
}
