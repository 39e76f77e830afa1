// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publisher that records every event for assertions.

use std::sync::Mutex;

use courier_core::types::{SessionStatus, TenantEvent, TenantId};
use courier_core::RealtimePublisher;

/// Captures published tenant events in order.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(TenantId, TenantEvent)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(TenantId, TenantEvent)> {
        self.events.lock().expect("publisher lock").clone()
    }

    /// Statuses from `state` events published for `tenant`, in order.
    pub fn state_trail(&self, tenant: &TenantId) -> Vec<SessionStatus> {
        self.events()
            .into_iter()
            .filter(|(t, _)| t == tenant)
            .filter_map(|(_, event)| match event {
                TenantEvent::State { status, .. } => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().expect("publisher lock").clear();
    }
}

impl RealtimePublisher for RecordingPublisher {
    fn publish(&self, tenant: &TenantId, event: TenantEvent) {
        self.events
            .lock()
            .expect("publisher lock")
            .push((tenant.clone(), event));
    }
}
