// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time notification seam.

use crate::types::{TenantEvent, TenantId};

/// Publishes events on a tenant-scoped real-time channel.
///
/// Fire-and-forget: publishing must never block or fail the caller. A
/// tenant with no live subscribers simply drops the event.
pub trait RealtimePublisher: Send + Sync {
    fn publish(&self, tenant: &TenantId, event: TenantEvent);
}

/// Publisher that discards every event. Useful for tests and headless runs.
#[derive(Debug, Default)]
pub struct NullPublisher;

impl RealtimePublisher for NullPublisher {
    fn publish(&self, _tenant: &TenantId, _event: TenantEvent) {}
}
