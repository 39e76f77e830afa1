// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle: connect, reset, disconnect, readiness.
//!
//! `connect` is single-flighted per tenant: concurrent callers share one
//! in-flight result, and a held lock without an in-flight future returns
//! the current state without acting (fail-soft). The lock is always
//! released when the connect settles, success or failure.

use std::sync::Arc;

use futures::FutureExt;
use tracing::{info, warn};

use courier_core::types::{SessionSnapshot, SessionStatus, TenantId};
use courier_core::CourierError;

use crate::engine::SessionEngine;
use crate::registry::ConnectTicket;

/// User-facing message for a failed client startup.
const INITIALIZE_FAILED: &str =
    "could not start the messaging session; please try connecting again";

impl SessionEngine {
    /// Connect (or join the in-flight connect of) a tenant's session.
    ///
    /// Returns the snapshot after the client's initialize settles; pairing
    /// and readiness arrive later as events. "Still initializing" is a
    /// valid, retriable outcome, not an error.
    pub async fn connect(&self, tenant: &TenantId) -> SessionSnapshot {
        // A connect in progress makes a scheduled auto-reconnect moot.
        self.registry.session(tenant).cancel_reconnect_timer();

        let engine = self.arc();
        let tenant_owned = tenant.clone();
        let ticket = self.registry.begin_connect(tenant, move || {
            async move {
                if let Err(e) = engine.do_connect(&tenant_owned).await {
                    warn!(tenant = %tenant_owned, error = %e, "connect failed");
                }
                // The finally path: the single-flight future and lock are
                // cleared no matter how the connect ended.
                let session = engine.registry.session(&tenant_owned);
                session.clear_pending();
                session.release_lock();
                session.snapshot()
            }
            .boxed()
        });

        match ticket {
            ConnectTicket::Lead(result) => {
                // Drive the connect to completion even if this caller is
                // dropped, so the lock and pending future always clear.
                let driver = result.clone();
                tokio::spawn(async move {
                    driver.await;
                });
                result.await
            }
            ConnectTicket::Join(result) => {
                info!(tenant = %tenant, "joining in-flight connect");
                result.await
            }
            ConnectTicket::Busy(snapshot) => snapshot,
        }
    }

    async fn do_connect(&self, tenant: &TenantId) -> Result<(), CourierError> {
        self.transition(tenant, |state| {
            state.status = SessionStatus::Initializing;
            state.last_error = None;
        });

        let result = self.start_client(tenant).await;
        if let Err(e) = &result {
            self.transition(tenant, |state| {
                state.status = SessionStatus::Error;
                state.last_error = Some(INITIALIZE_FAILED.to_string());
            });
            // Full clean slate so the next connect starts fresh, but the
            // retry counter survives.
            self.clear_session_resources(tenant, true).await;
            warn!(tenant = %tenant, error = %e, "session reset after initialize failure");
        }
        result
    }

    async fn start_client(&self, tenant: &TenantId) -> Result<(), CourierError> {
        let session = self.registry.session(tenant);
        let client = match session.client() {
            Some(existing) => existing,
            None => {
                let (client, events) = self.factory.create(tenant).await?;
                session.set_client(Arc::clone(&client));
                let pump = self.spawn_pump(tenant.clone(), events);
                session.set_pump(pump);
                client
            }
        };
        client.initialize().await
    }

    /// Destroy the session and delete credentials, returning to `Idle`.
    ///
    /// `preserve_attempts` keeps the QR retry counter across silent resets;
    /// a manual reset zeroes it.
    pub async fn reset_session(&self, tenant: &TenantId, preserve_attempts: bool) {
        self.clear_session_resources(tenant, true).await;

        let session = self.registry.session(tenant);
        session.clear_pending();
        session.release_lock();

        self.transition(tenant, |state| {
            state.status = SessionStatus::Idle;
            state.last_error = None;
            if !preserve_attempts {
                state.attempt_count = 0;
            }
        });
        info!(tenant = %tenant, preserve_attempts, "session reset");
    }

    /// Destroy the client but keep credentials, allowing silent resume.
    pub async fn disconnect(&self, tenant: &TenantId) {
        self.clear_session_resources(tenant, false).await;

        let session = self.registry.session(tenant);
        session.clear_pending();
        session.release_lock();

        self.transition(tenant, |state| {
            state.status = SessionStatus::Disconnected;
        });
        info!(tenant = %tenant, "session disconnected");
    }

    /// The network confirmed authentication: the session is usable.
    pub(crate) fn on_ready(&self, tenant: &TenantId) {
        self.transition(tenant, |state| {
            state.status = SessionStatus::Ready;
            state.last_error = None;
            state.attempt_count = 0;
        });
        info!(tenant = %tenant, "session ready");
    }

    /// The network rejected the stored credentials.
    pub(crate) fn on_auth_failure(&self, tenant: &TenantId, reason: String) {
        warn!(tenant = %tenant, reason = %reason, "authentication failure");
        self.transition(tenant, |state| {
            state.status = SessionStatus::Error;
            state.last_error = Some(format!(
                "authentication rejected by the messaging network: {reason}"
            ));
        });
    }
}
