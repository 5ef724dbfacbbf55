// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mockview serve` command implementation.
//!
//! Wires the OpenAI adapter, the question bank and the interview coordinator
//! into the gateway, then serves until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use mockview_config::model::MockviewConfig;
use mockview_core::MockviewError;
use mockview_core::traits::PluginAdapter;
use mockview_gateway::{ConnectionManager, GatewayState, spawn_heartbeat, start_server};
use mockview_interview::{Coordinator, QuestionBank, spawn_eviction_sweeper};
use mockview_openai::OpenAiProvider;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `mockview serve` command.
pub async fn run_serve(config: MockviewConfig) -> Result<(), MockviewError> {
    init_tracing(config.log_level());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.server.environment,
        "starting mockview serve"
    );

    let provider = Arc::new(OpenAiProvider::new(&config.openai)?);
    let questions = Arc::new(QuestionBank::from_config(&config.interview));
    let coordinator = Arc::new(Coordinator::new(
        provider.clone(),
        provider.clone(),
        questions,
        &config,
    ));

    let cancel = shutdown::install_signal_handler();

    let sweeper = spawn_eviction_sweeper(
        coordinator.sessions().clone(),
        Duration::from_secs(config.session.ttl_secs),
        Duration::from_secs(config.session.sweep_interval_secs),
        cancel.clone(),
    );

    let connections = Arc::new(ConnectionManager::new());
    let heartbeat = spawn_heartbeat(
        connections.clone(),
        Duration::from_secs(config.websocket.heartbeat_interval_secs),
        Duration::from_secs(config.websocket.inactivity_timeout_secs),
        cancel.clone(),
    );

    let state = GatewayState::new(coordinator, connections, &config);
    let result = start_server(&config.server, state, cancel.clone()).await;

    // A bind failure returns before any signal; stop the background tasks either way.
    cancel.cancel();
    let _ = heartbeat.await;
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }
    if let Err(e) = provider.shutdown().await {
        warn!(error = %e, "provider shutdown failed");
    }

    info!("mockview serve shutdown complete");
    result
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mockview={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
