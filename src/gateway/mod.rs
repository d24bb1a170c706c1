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

//! The HTTP gateway (component F): GET by record key, POST to publish, and
//! DELETE to stop sponsoring, plus an ambient `/metrics` endpoint.

use crate::monitoring::metrics::Metrics;
use crate::node::state::NodeState;
use crate::record;
use crate::routing::RoutingLayer;
use crate::validate::{self, Invalid};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Shared state handed to every gateway handler.
#[derive(Clone)]
pub struct AppState {
    /// The (out-of-scope) routing layer's local entry point.
    pub routing: Arc<dyn RoutingLayer>,
    /// Durable node state, for the republish set.
    pub node_state: Arc<Mutex<NodeState>>,
    /// The metrics registry.
    pub metrics: Arc<Metrics>,
}

/// Build the gateway's router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route(
            "/*path",
            get(get_handler).post(post_handler).delete(delete_handler),
        )
        .with_state(state)
}

/// Strip an optional `bz://` or `web+bz://` prefix from a gateway path.
fn strip_web_prefix(s: &str) -> &str {
    s.strip_prefix("web+bz://")
        .or_else(|| s.strip_prefix("bz://"))
        .unwrap_or(s)
}

/// Split `"name:fingerprint/subpath"` into the record-key part and an
/// optional subpath (the remainder after the first `/`, not including it).
fn split_key_and_subpath(s: &str) -> (&str, Option<&str>) {
    match s.find('/') {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    }
}

/// Strip an optional scheme prefix and split off a subpath. Exposed for
/// fuzzing the gateway's path-parsing boundary.
pub fn parse_path(raw: &str) -> (String, Option<String>) {
    let path = strip_web_prefix(raw);
    let (key_part, subpath) = split_key_and_subpath(path);
    (key_part.to_string(), subpath.map(str::to_string))
}

/// Whether `s` begins with a URI scheme (`^[a-zA-Z+]+://`).
fn looks_like_uri_scheme(s: &str) -> bool {
    match s.find("://") {
        Some(pos) if pos > 0 => s[..pos].chars().all(|c| c.is_ascii_alphabetic() || c == '+'),
        _ => false,
    }
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

fn html_redirect(url: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta http-equiv=\"refresh\" content=\"0; url={url}\"></head>\
         <body>Redirecting to <a href=\"{url}\">{url}</a></body></html>"
    )
}

async fn get_handler(
    State(state): State<AppState>,
    Path(raw_path): Path<String>,
    headers: HeaderMap,
) -> Response {
    let (key_part, subpath) = parse_path(&raw_path);

    let Ok((name, fingerprint)) = record::parse_record_key(&key_part) else {
        return respond(&state, "GET", StatusCode::NOT_FOUND, "not found");
    };
    let record_key = record::record_key(&name, &fingerprint);
    let storage_key = record::storage_key(&record_key);

    let Ok(Some(bytes)) = state.routing.get(storage_key).await else {
        return respond(&state, "GET", StatusCode::NOT_FOUND, "not found");
    };

    let Ok(valid_record) = validate::validate(None, &bytes, None).and_then(|_| {
        record::decode(&bytes).map_err(|_| Invalid::Malformed)
    }) else {
        return respond(&state, "GET", StatusCode::NOT_FOUND, "not found");
    };

    // A path remainder after the record key restores its leading `/` before
    // being appended, matching `key, path = key.split('/', 1); path = '/' + path`.
    let full_message = match subpath {
        Some(sub) => format!("{}/{}", valid_record.message, sub),
        None => valid_record.message.clone(),
    };

    if wants_html(&headers) {
        if looks_like_uri_scheme(&full_message) && !full_message.contains('\'') && !full_message.contains('"') {
            state.metrics.record_gateway_request("GET", 200);
            return (StatusCode::OK, [(header::CONTENT_TYPE, "text/html; charset=utf-8")], html_redirect(&full_message))
                .into_response();
        }
        state.metrics.record_gateway_request("GET", 200);
        return (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], full_message).into_response();
    }

    state.metrics.record_gateway_request("GET", 200);
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], bytes).into_response()
}

async fn post_handler(State(state): State<AppState>, body: axum::body::Bytes) -> Response {
    match validate::validate(None, &body, None) {
        Ok(valid) => {
            let storage_key = record::storage_key(&valid.record_key);
            let Ok(body_str) = String::from_utf8(body.to_vec()) else {
                return respond(&state, "POST", StatusCode::BAD_REQUEST, "malformed record");
            };
            {
                let mut node_state = state.node_state.lock().await;
                node_state.republish.insert(valid.record_key.clone(), body_str);
            }
            match state.routing.set(storage_key, body.to_vec()).await {
                Ok(()) => respond(&state, "POST", StatusCode::OK, &valid.record_key),
                Err(_) => respond(&state, "POST", StatusCode::BAD_GATEWAY, "routing failure"),
            }
        }
        Err(reason) => respond(&state, "POST", StatusCode::BAD_REQUEST, &reason.to_string()),
    }
}

async fn delete_handler(State(state): State<AppState>, Path(raw_path): Path<String>) -> Response {
    let (key_part, _) = parse_path(&raw_path);

    let Ok((name, fingerprint)) = record::parse_record_key(&key_part) else {
        return respond(&state, "DELETE", StatusCode::BAD_REQUEST, "invalid record key");
    };
    let record_key = record::record_key(&name, &fingerprint);

    let mut node_state = state.node_state.lock().await;
    if node_state.republish.shift_remove(&record_key).is_some() {
        respond(&state, "DELETE", StatusCode::OK, "cancelled")
    } else {
        respond(&state, "DELETE", StatusCode::BAD_REQUEST, "not sponsored")
    }
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let stats = state.routing.stats().await;
    state.metrics.observe_storage(stats);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.encode(),
    )
        .into_response()
}

fn respond(state: &AppState, method: &str, status: StatusCode, body: &str) -> Response {
    info!(method, status = status.as_u16(), "gateway request");
    state.metrics.record_gateway_request(method, status.as_u16());
    (status, body.to_string()).into_response()
}
