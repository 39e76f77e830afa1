// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant session state registry.
//!
//! Holds the session snapshot, connect lock, in-flight connect future, live
//! client handle, and timer handles for every tenant. Entries are created
//! lazily on first reference and live for the process lifetime. The registry
//! is an explicit object passed to every component, never module-level
//! mutable state, so tests run isolated registries side by side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::AbortHandle;

use courier_core::types::{SessionSnapshot, SessionStatus, TenantId};
use courier_core::MessengerClient;

/// Shared in-flight connect result; concurrent callers await the same one.
pub type ConnectFuture = Shared<BoxFuture<'static, SessionSnapshot>>;

/// Outcome of asking the registry to start a connect.
pub enum ConnectTicket {
    /// This caller owns the new in-flight connect.
    Lead(ConnectFuture),
    /// Another caller's connect is in flight; share its result.
    Join(ConnectFuture),
    /// The lock is held with no in-flight future; fail soft with the
    /// current state.
    Busy(SessionSnapshot),
}

/// Recover a poisoned lock rather than propagating the panic: a tenant's
/// session entry must stay usable even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// All mutable state for one tenant's session.
pub struct TenantSession {
    state: Mutex<SessionSnapshot>,
    lock_held: AtomicBool,
    pending: Mutex<Option<ConnectFuture>>,
    client: Mutex<Option<Arc<dyn MessengerClient>>>,
    qr_timer: Mutex<Option<AbortHandle>>,
    reconnect_timer: Mutex<Option<AbortHandle>>,
    pump: Mutex<Option<AbortHandle>>,
}

impl Default for TenantSession {
    fn default() -> Self {
        Self {
            state: Mutex::new(SessionSnapshot::default()),
            lock_held: AtomicBool::new(false),
            pending: Mutex::new(None),
            client: Mutex::new(None),
            qr_timer: Mutex::new(None),
            reconnect_timer: Mutex::new(None),
            pump: Mutex::new(None),
        }
    }
}

impl TenantSession {
    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.state).clone()
    }

    pub fn status(&self) -> SessionStatus {
        lock(&self.state).status
    }

    /// Apply `f` to the state under the lock and return the result snapshot.
    pub fn with_state(&self, f: impl FnOnce(&mut SessionSnapshot)) -> SessionSnapshot {
        let mut state = lock(&self.state);
        f(&mut state);
        state.clone()
    }

    pub fn client(&self) -> Option<Arc<dyn MessengerClient>> {
        lock(&self.client).clone()
    }

    pub fn set_client(&self, client: Arc<dyn MessengerClient>) {
        *lock(&self.client) = Some(client);
    }

    pub fn take_client(&self) -> Option<Arc<dyn MessengerClient>> {
        lock(&self.client).take()
    }

    pub fn lock_is_held(&self) -> bool {
        self.lock_held.load(Ordering::SeqCst)
    }

    pub fn release_lock(&self) {
        self.lock_held.store(false, Ordering::SeqCst);
    }

    pub fn clear_pending(&self) {
        *lock(&self.pending) = None;
    }

    pub fn set_qr_timer(&self, handle: AbortHandle) {
        if let Some(old) = lock(&self.qr_timer).replace(handle) {
            old.abort();
        }
    }

    pub fn cancel_qr_timer(&self) {
        if let Some(handle) = lock(&self.qr_timer).take() {
            handle.abort();
        }
    }

    /// Drop the stored QR timer handle without aborting. Called by the
    /// timer task itself once the window has fired, so that a later cancel
    /// does not abort the task mid-handling.
    pub fn clear_qr_timer(&self) {
        lock(&self.qr_timer).take();
    }

    pub fn set_reconnect_timer(&self, handle: AbortHandle) {
        if let Some(old) = lock(&self.reconnect_timer).replace(handle) {
            old.abort();
        }
    }

    pub fn cancel_reconnect_timer(&self) {
        if let Some(handle) = lock(&self.reconnect_timer).take() {
            handle.abort();
        }
    }

    /// Drop the stored reconnect timer handle without aborting. Called by
    /// the timer task itself before it re-enters connect.
    pub fn clear_reconnect_timer(&self) {
        lock(&self.reconnect_timer).take();
    }

    pub fn set_pump(&self, handle: AbortHandle) {
        if let Some(old) = lock(&self.pump).replace(handle) {
            old.abort();
        }
    }

    pub fn abort_pump(&self) {
        if let Some(handle) = lock(&self.pump).take() {
            handle.abort();
        }
    }
}

/// Registry of per-tenant session entries.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<TenantSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tenant's session entry, created lazily.
    pub fn session(&self, tenant: &TenantId) -> Arc<TenantSession> {
        self.sessions
            .entry(tenant.as_str().to_string())
            .or_default()
            .clone()
    }

    pub fn snapshot(&self, tenant: &TenantId) -> SessionSnapshot {
        self.session(tenant).snapshot()
    }

    pub fn status(&self, tenant: &TenantId) -> SessionStatus {
        self.session(tenant).status()
    }

    pub fn client(&self, tenant: &TenantId) -> Option<Arc<dyn MessengerClient>> {
        self.session(tenant).client()
    }

    /// Tenant ids with a registry entry.
    pub fn tenants(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    /// Decide atomically whether a connect may start.
    ///
    /// `build` is only invoked when this caller becomes the lead; the
    /// resulting future is stored so concurrent callers join it. The
    /// decision runs under the pending-future lock, so exactly one caller
    /// leads no matter how many race.
    pub fn begin_connect(
        &self,
        tenant: &TenantId,
        build: impl FnOnce() -> BoxFuture<'static, SessionSnapshot>,
    ) -> ConnectTicket {
        let session = self.session(tenant);
        let mut pending = lock(&session.pending);

        if let Some(in_flight) = pending.as_ref() {
            return ConnectTicket::Join(in_flight.clone());
        }

        if session.lock_held.swap(true, Ordering::SeqCst) {
            return ConnectTicket::Busy(session.snapshot());
        }

        let shared = build().shared();
        *pending = Some(shared.clone());
        ConnectTicket::Lead(shared)
    }
}
