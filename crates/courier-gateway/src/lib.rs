// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Courier platform.
//!
//! Exposes tenant lifecycle operations, send endpoints, campaign runs, and
//! the per-tenant realtime channel. API routes require a bearer token
//! (fail-closed when unconfigured).

pub mod auth;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use server::{build_router, start_server, GatewayState, HealthState};
pub use ws::WsPublisher;
