// Copyright (c) 2026 bizast contributors
// Licensed under the Apache-2.0 License.

//! End-to-end scenario tests that cross module boundaries: durable state
//! persisted and reloaded across a simulated restart, and the gateway
//! wired to a real storage-backed routing layer.

use bizast::gateway::{self, AppState};
use bizast::monitoring::metrics::Metrics;
use bizast::node::state::NodeState;
use bizast::record;
use bizast::routing::{LocalRoutingLayer, RoutingLayer};
use bizast::storage::Storage;
use http_body_util::BodyExt;
use ring::signature::{Ed25519KeyPair, KeyPair};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

fn signed_record(seed: u8, name: &str, message: &str, version: u64) -> (String, Vec<u8>) {
    let seed_bytes = [seed; 32];
    let kp = Ed25519KeyPair::from_seed_unchecked(&seed_bytes).unwrap();
    let key_bytes = kp.public_key().as_ref().to_vec();
    let fp = record::fingerprint(&key_bytes);
    let plaintext = record::canonical_plaintext(name, message, version);
    let sig = kp.sign(&plaintext);
    let rec = record::Record {
        name: name.to_string(),
        message: message.to_string(),
        version,
        key: hex::encode(key_bytes),
        signature: hex::encode(sig.as_ref()),
    };
    (record::record_key(name, &fp), record::encode(&rec))
}

fn test_app() -> (AppState, axum::Router) {
    let storage = Arc::new(Mutex::new(Storage::with_defaults()));
    let routing: Arc<dyn RoutingLayer> = Arc::new(LocalRoutingLayer::new(storage));
    let state = AppState {
        routing,
        node_state: Arc::new(Mutex::new(NodeState::fresh(vec![]))),
        metrics: Arc::new(Metrics::new()),
    };
    let app = gateway::router(state.clone());
    (state, app)
}

#[tokio::test]
async fn s6_sponsored_republish_survives_restart() {
    use axum::body::Body;
    use axum::http::Request;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    let (record_key, bytes) = signed_record(9, "home", "https://example.org/", 0);

    let (app_state, app) = test_app();
    let post = Request::post(format!("/{record_key}")).body(Body::from(bytes.clone())).unwrap();
    let resp = app.oneshot(post).await.unwrap();
    assert_eq!(resp.status(), axum::http::StatusCode::OK);

    {
        let node_state = app_state.node_state.lock().await;
        node_state.save(&state_path).unwrap();
    }

    // Simulate a restart: load node state fresh from disk.
    let reloaded = NodeState::load_or_create(&state_path, vec![]).unwrap();
    assert!(reloaded.republish.contains_key(&record_key));
    assert_eq!(reloaded.republish.get(&record_key).unwrap().as_bytes(), bytes.as_slice());
}

#[tokio::test]
async fn s3_different_signer_lives_at_a_different_storage_key() {
    use axum::body::Body;
    use axum::http::Request;

    let (key_a, bytes_a) = signed_record(1, "home", "https://example.org/", 0);
    let (key_b, bytes_b) = signed_record(2, "home", "https://example.org/", 0);
    assert_ne!(key_a, key_b);

    let (_, app) = test_app();
    let post_a = Request::post(format!("/{key_a}")).body(Body::from(bytes_a)).unwrap();
    app.clone().oneshot(post_a).await.unwrap();

    let get_b = Request::get(format!("/{key_b}"))
        .header("accept", "application/json")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(get_b).await.unwrap();
    assert_eq!(resp.status(), axum::http::StatusCode::NOT_FOUND);

    let get_a = Request::get(format!("/{key_a}"))
        .header("accept", "application/json")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(get_a).await.unwrap();
    assert_eq!(resp.status(), axum::http::StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(record::decode(&body).is_ok());
}
