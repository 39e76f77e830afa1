// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP bridge to the external messaging client-host service.
//!
//! The real [`courier_core::MessengerClient`] implementation: commands are
//! HTTP calls against a per-tenant instance on the host; events flow back
//! through an ingest endpoint into each tenant's bounded queue. The fake
//! used by tests lives in `courier-test-utils`.

pub mod client;
pub mod events;
pub mod ingest;

pub use client::{HttpMessengerClient, HttpMessengerFactory};
pub use events::BridgeEvent;
pub use ingest::ingest_router;
