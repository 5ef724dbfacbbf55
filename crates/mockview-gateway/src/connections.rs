// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket connection bookkeeping and the heartbeat sweep.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use mockview_core::types::InterviewStyle;

/// Public view of one live connection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub session_id: String,
    pub client_address: String,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub interview_style: InterviewStyle,
}

/// Aggregate connection counters.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStats {
    pub total_connections: u64,
    pub active_connections: usize,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub errors_count: u64,
    pub uptime_seconds: f64,
}

struct Connection {
    /// Distinguishes a reconnect from the connection it replaced.
    connection_id: String,
    info: ConnectionInfo,
    cancel: CancellationToken,
}

/// Tracks live WebSocket connections, keyed by session id.
///
/// Closing a connection never deletes its interview session.
pub struct ConnectionManager {
    connections: DashMap<String, Connection>,
    total_connections: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    errors: AtomicU64,
    started: Instant,
}

/// Handle returned by [`ConnectionManager::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub connection_id: String,
    /// Fires when the connection should be closed server-side.
    pub cancel: CancellationToken,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            total_connections: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Records a new connection for `session_id`.
    ///
    /// An existing connection for the same session is closed and replaced.
    pub fn register(
        &self,
        session_id: &str,
        client_address: &str,
        style: InterviewStyle,
    ) -> Registration {
        let now = Utc::now();
        let registration = Registration {
            connection_id: uuid::Uuid::new_v4().to_string(),
            cancel: CancellationToken::new(),
        };
        let connection = Connection {
            connection_id: registration.connection_id.clone(),
            info: ConnectionInfo {
                session_id: session_id.to_string(),
                client_address: client_address.to_string(),
                connected_at: now,
                last_activity: now,
                interview_style: style,
            },
            cancel: registration.cancel.clone(),
        };

        if let Some(previous) = self.connections.insert(session_id.to_string(), connection) {
            debug!(session_id, "replacing existing connection");
            previous.cancel.cancel();
        }
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        info!(session_id, client_address, "websocket connected");
        registration
    }

    /// Removes the connection if it is still the one registered under `connection_id`.
    pub fn unregister(&self, session_id: &str, connection_id: &str) {
        let removed = self
            .connections
            .remove_if(session_id, |_, conn| conn.connection_id == connection_id);
        if removed.is_some() {
            info!(session_id, "websocket disconnected");
        }
    }

    pub fn touch(&self, session_id: &str) {
        if let Some(mut conn) = self.connections.get_mut(session_id) {
            conn.info.last_activity = Utc::now();
        }
    }

    pub fn set_style(&self, session_id: &str, style: InterviewStyle) {
        if let Some(mut conn) = self.connections.get_mut(session_id) {
            conn.info.interview_style = style;
        }
    }

    pub fn record_received(&self, session_id: &str) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.touch(session_id);
    }

    pub fn record_sent(&self, session_id: &str) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.touch(session_id);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }

    pub fn active_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.connections
            .iter()
            .map(|entry| entry.value().info.clone())
            .collect()
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.connections.len(),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            errors_count: self.errors.load(Ordering::Relaxed),
            uptime_seconds: self.started.elapsed().as_secs_f64(),
        }
    }

    /// Closes connections idle for longer than `timeout`. Returns their session ids.
    pub fn close_idle(&self, timeout: Duration) -> Vec<String> {
        let now = Utc::now();
        let idle: Vec<String> = self
            .connections
            .iter()
            .filter(|entry| {
                (now - entry.value().info.last_activity)
                    .to_std()
                    .is_ok_and(|idle| idle > timeout)
            })
            .map(|entry| entry.key().clone())
            .collect();

        for session_id in &idle {
            if let Some((_, conn)) = self.connections.remove(session_id) {
                info!(session_id = %session_id, "closing inactive websocket connection");
                conn.cancel.cancel();
            }
        }
        idle
    }

    /// Cancels every live connection.
    pub fn close_all(&self) {
        for entry in self.connections.iter() {
            entry.value().cancel.cancel();
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the heartbeat sweep that closes idle connections every `interval`.
pub fn spawn_heartbeat(
    manager: Arc<ConnectionManager>,
    interval: Duration,
    inactivity_timeout: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let closed = manager.close_idle(inactivity_timeout);
                    if !closed.is_empty() {
                        debug!(closed = closed.len(), active = manager.active_count(), "heartbeat sweep");
                    }
                }
                _ = cancel.cancelled() => {
                    manager.close_all();
                    debug!("heartbeat sweep stopped");
                    break;
                }
            }
        }
    })
}
