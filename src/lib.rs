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

//! bizast - a peer-to-peer naming service.
//!
//! A node stores short, signed resource records scoped under the
//! publisher's key fingerprint and disseminates them over a Kademlia-style
//! DHT. A local HTTP gateway exposes lookup, publication, and
//! republish-cancellation to clients and browsers.
//!
//! - Record codec & identity: canonical serialization, fingerprint
//!   derivation, key parsing ([`record`]).
//! - Validation: the single predicate every accepted record must satisfy
//!   ([`validate`]).
//! - Storage: the bounded, popularity-evicting record store
//!   ([`storage`]).
//! - Node state & republication: durable identity and sponsorship
//!   ([`node`]).
//! - Gateway: the HTTP surface ([`gateway`]).
//! - Observability and CLI ([`monitoring`], [`config`]).

/// Operator-facing CLI surface and environment overrides.
pub mod config;
/// Shared cryptographic primitives and the atomic-file-write idiom.
pub mod crypto;
/// The HTTP gateway.
pub mod gateway;
/// Observability: Prometheus metrics.
pub mod monitoring;
/// Durable node state and the republisher.
pub mod node;
/// Record codec & identity.
pub mod record;
/// The routing-layer contract and its local stand-in.
pub mod routing;
/// The storage engine.
pub mod storage;
/// The validator.
pub mod validate;
