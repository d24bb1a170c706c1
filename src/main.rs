#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! bizast node entrypoint: wires together durable state, the storage
//! engine, the local routing stand-in, the republisher, and the HTTP
//! gateway, then serves until interrupted.

use std::sync::Arc;

use bizast::config::Cli;
use bizast::gateway::{self, AppState};
use bizast::monitoring::metrics::Metrics;
use bizast::node::state::{self, NodeState};
use bizast::node::republisher;
use bizast::routing::{LocalRoutingLayer, RoutingLayer};
use bizast::storage::Storage;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .compact()
        .try_init();

    let state_path = state::state_path(&cli.instancename);
    let node_state = match NodeState::load_or_create(&state_path, cli.bootstrap_hints()) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("failed to load or create node state at {}: {err}", state_path.display());
            std::process::exit(1);
        }
    };
    let node_state = Arc::new(Mutex::new(node_state));

    let storage = Arc::new(Mutex::new(Storage::with_defaults()));
    let routing: Arc<dyn RoutingLayer> = Arc::new(LocalRoutingLayer::new(storage));
    let metrics = Arc::new(Metrics::new());

    info!(
        dhtport = cli.dhtport,
        webport = cli.webport,
        instance = %cli.instancename,
        state = %state_path.display(),
        "bizast node starting"
    );

    let save_task = tokio::spawn(state::run_save_loop(node_state.clone(), state_path.clone()));
    let republish_task = tokio::spawn(republisher::run(node_state.clone(), routing.clone(), metrics.clone()));

    let app_state = AppState { routing, node_state: node_state.clone(), metrics };
    let app = gateway::router(app_state);

    let addr = format!("0.0.0.0:{}", cli.webport);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(err) => {
            eprintln!("failed to bind gateway on {addr}: {err}");
            std::process::exit(1);
        }
    };
    info!(addr = %addr, "gateway listening");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(err) = serve_result {
        warn!(error = %err, "gateway server exited with an error");
    }

    save_task.abort();
    republish_task.abort();

    let snapshot = node_state.lock().await.clone();
    if let Err(err) = snapshot.save(&state_path) {
        warn!(error = %err, "failed to save node state on shutdown");
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
