// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant session management for the Courier platform.
//!
//! Owns the state machine for pairing and reconnecting a tenant's messaging
//! identity: single-flighted connects, the QR pairing window with bounded
//! retry, logout-aware reconnect scheduling, in-order inbound event routing,
//! and round-robin conversation assignment. Many tenants run concurrently
//! and independently; there is no cross-tenant shared state outside the
//! registry.

pub mod assign;
pub mod engine;
pub mod lifecycle;
pub mod qr;
pub mod reconnect;
pub mod registry;
pub mod router;
pub mod shutdown;

pub use assign::AutoAssignCoordinator;
pub use engine::SessionEngine;
pub use registry::{ConnectTicket, SessionRegistry, TenantSession};
pub use router::EventRouter;
pub use shutdown::{drain_sessions, install_signal_handler};
