// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the interview coordinator.
//!
//! REST handlers and the WebSocket channel drive the same
//! [`mockview_interview::Coordinator`], so a session can be started over HTTP
//! and continued over a socket (or the other way round).

pub mod connections;
pub mod handlers;
pub mod server;
pub mod ws;

pub use connections::{ConnectionInfo, ConnectionManager, ConnectionStats, spawn_heartbeat};
pub use handlers::{ApiEnvelope, ApiError, ErrorBody};
pub use server::{GatewayState, build_router, start_server};
pub use ws::{ClientFrame, FrameError, ServerFrame, ServerPayload};
