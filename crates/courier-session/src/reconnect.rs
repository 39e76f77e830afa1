// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Disconnect handling and auto-reconnect.
//!
//! An explicit logout gets a full reset (credentials deleted, no retry):
//! a logged-out identity cannot resume from stored credentials, and
//! retrying would loop on failure. Any other disconnect reason schedules a
//! single delayed auto-reconnect, unless the process is shutting down.

use tracing::{info, warn};

use courier_core::types::{SessionStatus, TenantId};

use crate::engine::SessionEngine;

impl SessionEngine {
    /// The external client reported a dropped connection.
    pub(crate) async fn on_disconnected(&self, tenant: &TenantId, reason: String) {
        warn!(tenant = %tenant, reason = %reason, "session disconnected by network");

        let session = self.registry.session(tenant);
        // The connection is already gone; just drop the handle. The pump
        // ends on its own when the client's sender is dropped.
        session.take_client();
        session.cancel_qr_timer();

        self.transition(tenant, |state| {
            state.status = SessionStatus::Disconnected;
            state.last_error = Some(reason.clone());
        });

        if self.is_logout(&reason) {
            info!(tenant = %tenant, "explicit logout, clearing credentials");
            // Spawned: this handler runs inside the pump task, and the
            // reset aborts that task.
            let engine = self.arc();
            let tenant_owned = tenant.clone();
            tokio::spawn(async move {
                engine.reset_session(&tenant_owned, false).await;
            });
            return;
        }

        if self.shutdown.is_cancelled() {
            return;
        }

        let engine = self.arc();
        let tenant_owned = tenant.clone();
        let delay = self.reconnect_delay();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if engine.shutdown.is_cancelled() {
                return;
            }
            // Drop our own stored handle before connect cancels it.
            engine.registry.session(&tenant_owned).clear_reconnect_timer();
            info!(tenant = %tenant_owned, "auto-reconnect attempt");
            engine.connect(&tenant_owned).await;
        })
        .abort_handle();
        session.set_reconnect_timer(handle);
    }

    /// Case-insensitive match of the disconnect reason against the
    /// configured logout needles.
    pub(crate) fn is_logout(&self, reason: &str) -> bool {
        let lowered = reason.to_lowercase();
        self.config
            .logout_reasons
            .iter()
            .any(|needle| lowered.contains(&needle.to_lowercase()))
    }
}
