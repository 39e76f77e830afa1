// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QR pairing window supervision.
//!
//! Entering `WaitingQr` (re)starts a fixed timeout window; on expiry the
//! session is silently reset and the connect retried, up to a bounded
//! number of attempts. The cap exists because QR generation failure is
//! usually environmental rather than user error.

use tracing::{info, warn};

use courier_core::types::{SessionStatus, TenantId};

use crate::engine::SessionEngine;

/// User-facing message when the retry cap is exhausted.
const QR_EXHAUSTED: &str =
    "no QR code could be generated; a manual session reset is required";

impl SessionEngine {
    /// A pairing QR payload arrived: store it and (re)start the window.
    pub(crate) fn on_qr(&self, tenant: &TenantId, payload: String) {
        self.transition(tenant, |state| {
            state.status = SessionStatus::WaitingQr;
            state.qr_payload = Some(payload);
        });

        let engine = self.arc();
        let tenant_owned = tenant.clone();
        let timeout = self.qr_timeout();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            engine.on_qr_timeout(&tenant_owned).await;
        })
        .abort_handle();
        // Replacing the handle restarts the window for a refreshed QR.
        self.registry.session(tenant).set_qr_timer(handle);
    }

    /// The pairing window expired without a scan.
    pub(crate) async fn on_qr_timeout(&self, tenant: &TenantId) {
        // This runs inside the timer task: drop the stored handle first so
        // the reset below cannot abort the task mid-flight.
        self.registry.session(tenant).clear_qr_timer();

        let status = self.registry.status(tenant);
        if !matches!(
            status,
            SessionStatus::Initializing | SessionStatus::WaitingQr
        ) {
            // The session moved on (ready, reset, ...); the timeout is moot.
            return;
        }

        info!(tenant = %tenant, "QR pairing window expired, resetting silently");
        self.reset_session(tenant, true).await;

        let snapshot = self.transition(tenant, |state| {
            state.attempt_count += 1;
        });

        if snapshot.attempt_count < self.config.max_qr_attempts {
            info!(
                tenant = %tenant,
                attempt = snapshot.attempt_count,
                "retrying connect after QR timeout"
            );
            self.connect(tenant).await;
        } else {
            warn!(
                tenant = %tenant,
                attempts = snapshot.attempt_count,
                "QR retry cap reached"
            );
            self.transition(tenant, |state| {
                state.status = SessionStatus::Error;
                state.last_error = Some(QR_EXHAUSTED.to_string());
            });
        }
    }
}
