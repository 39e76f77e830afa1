// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-tenant session engine.
//!
//! One `SessionEngine` serves every tenant; all per-tenant state lives in
//! the [`SessionRegistry`]. The engine owns the messaging-client factory,
//! the credential store, and the event router, and spawns one bounded pump
//! task per tenant that drains the client's events in order. Lifecycle
//! operations live in `lifecycle`, the QR pairing window in `qr`, and
//! disconnect handling in `reconnect`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use courier_core::types::{
    MessengerEvent, SessionSnapshot, SessionStatus, TenantEvent, TenantId,
};
use courier_core::{CredentialStore, MessengerFactory, RealtimePublisher};
use courier_config::model::SessionConfig;

use crate::registry::SessionRegistry;
use crate::router::EventRouter;

pub struct SessionEngine {
    pub(crate) registry: Arc<SessionRegistry>,
    pub(crate) factory: Arc<dyn MessengerFactory>,
    pub(crate) credentials: Arc<dyn CredentialStore>,
    pub(crate) publisher: Arc<dyn RealtimePublisher>,
    pub(crate) router: Arc<EventRouter>,
    pub(crate) config: SessionConfig,
    pub(crate) shutdown: CancellationToken,
    /// Self-handle for spawning engine-owned tasks (timers, pumps).
    self_ref: Weak<SessionEngine>,
}

impl SessionEngine {
    pub fn new(
        registry: Arc<SessionRegistry>,
        factory: Arc<dyn MessengerFactory>,
        credentials: Arc<dyn CredentialStore>,
        publisher: Arc<dyn RealtimePublisher>,
        router: Arc<EventRouter>,
        config: SessionConfig,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            registry,
            factory,
            credentials,
            publisher,
            router,
            config,
            shutdown,
            self_ref: self_ref.clone(),
        })
    }

    /// Strong self-handle. The engine only ever lives inside the Arc built
    /// by [`new`](Self::new), so the upgrade cannot fail while `&self` is
    /// reachable.
    pub(crate) fn arc(&self) -> Arc<Self> {
        self.self_ref
            .upgrade()
            .expect("engine is always Arc-owned")
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn snapshot(&self, tenant: &TenantId) -> SessionSnapshot {
        self.registry.snapshot(tenant)
    }

    pub(crate) fn qr_timeout(&self) -> Duration {
        Duration::from_secs(self.config.qr_timeout_secs)
    }

    pub(crate) fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.config.reconnect_delay_secs)
    }

    /// Apply a state change, enforce the QR-payload invariant, cancel a
    /// mooted pairing timer, and publish the resulting state.
    ///
    /// Invariants enforced here:
    /// - `qr_payload` is cleared on every transition away from `WaitingQr`.
    /// - Leaving `WaitingQr` for any status other than `Initializing`
    ///   cancels the pairing window timer.
    pub(crate) fn transition(
        &self,
        tenant: &TenantId,
        apply: impl FnOnce(&mut SessionSnapshot),
    ) -> SessionSnapshot {
        let session = self.registry.session(tenant);
        let mut left_waiting_qr = false;
        let snapshot = session.with_state(|state| {
            let old = state.status;
            apply(state);
            if state.status != SessionStatus::WaitingQr {
                state.qr_payload = None;
            }
            state.updated_at = chrono::Utc::now();
            left_waiting_qr = old == SessionStatus::WaitingQr
                && state.status != SessionStatus::WaitingQr
                && state.status != SessionStatus::Initializing;
        });
        if left_waiting_qr {
            session.cancel_qr_timer();
        }

        debug!(tenant = %tenant, status = %snapshot.status, "session state changed");
        self.publisher.publish(
            tenant,
            TenantEvent::State {
                status: snapshot.status,
                qr: snapshot.qr_payload.clone(),
                error: snapshot.last_error.clone(),
                timestamp: snapshot.updated_at,
            },
        );
        snapshot
    }

    /// Spawn the per-tenant pump draining client events in arrival order.
    ///
    /// The pump exits when the client drops its sender. Every handler error
    /// is caught and logged; a tenant's bad event never unwinds the task.
    pub(crate) fn spawn_pump(
        &self,
        tenant: TenantId,
        mut events: mpsc::Receiver<MessengerEvent>,
    ) -> tokio::task::AbortHandle {
        let engine = self.arc();
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                engine.handle_event(&tenant, event).await;
            }
            debug!(tenant = %tenant, "event pump finished");
        });
        handle.abort_handle()
    }

    pub(crate) async fn handle_event(&self, tenant: &TenantId, event: MessengerEvent) {
        match event {
            MessengerEvent::Qr(payload) => self.on_qr(tenant, payload),
            MessengerEvent::Ready => self.on_ready(tenant),
            MessengerEvent::Credentials { blob } => {
                if let Err(e) = self.credentials.save(tenant, &blob).await {
                    warn!(tenant = %tenant, error = %e, "credential save failed");
                }
            }
            MessengerEvent::AuthFailure(reason) => self.on_auth_failure(tenant, reason),
            MessengerEvent::Disconnected { reason } => {
                self.on_disconnected(tenant, reason).await;
            }
            MessengerEvent::Message(message) => {
                if let Err(e) = self.router.on_message(tenant, message).await {
                    warn!(tenant = %tenant, error = %e, "inbound message handling failed");
                }
            }
            MessengerEvent::MessageAck { message_id, raw_code } => {
                if let Err(e) = self.router.on_ack(tenant, &message_id, raw_code).await {
                    warn!(tenant = %tenant, error = %e, "ack handling failed");
                }
            }
            MessengerEvent::Reaction {
                message_id,
                sender,
                text,
            } => {
                if let Err(e) = self
                    .router
                    .on_reaction(tenant, &message_id, &sender, &text)
                    .await
                {
                    warn!(tenant = %tenant, error = %e, "reaction handling failed");
                }
            }
        }
    }

    /// Tear down a tenant's live resources: client, pump, timers, and
    /// optionally the persisted credentials. Leaves the state untouched so
    /// callers decide the resulting status.
    pub(crate) async fn clear_session_resources(
        &self,
        tenant: &TenantId,
        delete_credentials: bool,
    ) {
        let session = self.registry.session(tenant);
        session.cancel_qr_timer();
        session.cancel_reconnect_timer();
        session.abort_pump();

        if let Some(client) = session.take_client() {
            // Destroy failures are tolerated: the client may already be gone.
            if let Err(e) = client.destroy().await {
                warn!(tenant = %tenant, error = %e, "client destroy failed");
            }
        }

        if delete_credentials {
            if let Err(e) = self.credentials.delete(tenant).await {
                warn!(tenant = %tenant, error = %e, "credential delete failed");
            }
        }
    }
}
