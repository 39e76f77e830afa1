// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end session state machine tests against the deterministic fake
//! messaging client. Timers run under tokio's paused clock.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use courier_config::model::{ResolverConfig, SessionConfig, WebhookConfig};
use courier_core::types::{MessengerEvent, SessionStatus};
use courier_core::{NullAutomation, TenantId};
use courier_session::{EventRouter, SessionEngine, SessionRegistry};
use courier_test_utils::{
    MemoryCredentials, MemoryDataStore, MockMessengerFactory, RecordingPublisher,
};
use courier_webhook::WebhookNotifier;

struct Harness {
    engine: Arc<SessionEngine>,
    factory: Arc<MockMessengerFactory>,
    credentials: Arc<MemoryCredentials>,
    publisher: Arc<RecordingPublisher>,
    shutdown: CancellationToken,
}

fn harness() -> Harness {
    harness_with(SessionConfig::default())
}

fn harness_with(config: SessionConfig) -> Harness {
    let registry = Arc::new(SessionRegistry::new());
    let factory = Arc::new(MockMessengerFactory::new());
    let store = Arc::new(MemoryDataStore::new());
    let credentials = Arc::new(MemoryCredentials::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let webhook = Arc::new(WebhookNotifier::new(
        &WebhookConfig::default(),
        store.clone(),
    ));
    let router = Arc::new(EventRouter::new(
        store,
        publisher.clone(),
        webhook,
        Arc::new(NullAutomation),
        ResolverConfig::default(),
        &config,
    ));
    let shutdown = CancellationToken::new();
    let engine = SessionEngine::new(
        registry,
        factory.clone(),
        credentials.clone(),
        publisher.clone(),
        router,
        config,
        shutdown.clone(),
    );
    Harness {
        engine,
        factory,
        credentials,
        publisher,
        shutdown,
    }
}

/// Let spawned tasks and (paused) timers make progress.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test(start_paused = true)]
async fn concurrent_connects_share_one_initialize() {
    let h = harness();
    let tenant = TenantId::from("acme");

    let results = futures::future::join_all(
        (0..5).map(|_| h.engine.connect(&tenant)),
    )
    .await;

    assert_eq!(h.factory.create_calls(), 1, "one client created");
    let client = h.factory.client(&tenant).await.unwrap();
    assert_eq!(client.initialize_calls(), 1, "one initialize invocation");

    // All callers observe the same outcome.
    for snapshot in results {
        assert_eq!(snapshot.status, SessionStatus::Initializing);
    }
}

#[tokio::test(start_paused = true)]
async fn ready_event_completes_the_connect() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Ready).await;
    settle().await;

    let snapshot = h.engine.snapshot(&tenant);
    assert_eq!(snapshot.status, SessionStatus::Ready);
    assert_eq!(snapshot.attempt_count, 0);
    assert!(snapshot.qr_payload.is_none());
}

#[tokio::test(start_paused = true)]
async fn qr_event_opens_the_pairing_window() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Qr("qr-one".into())).await;
    settle().await;

    let snapshot = h.engine.snapshot(&tenant);
    assert_eq!(snapshot.status, SessionStatus::WaitingQr);
    assert_eq!(snapshot.qr_payload.as_deref(), Some("qr-one"));
}

#[tokio::test(start_paused = true)]
async fn scanning_clears_qr_payload_on_ready() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Qr("qr-one".into())).await;
    settle().await;
    client.emit(MessengerEvent::Ready).await;
    settle().await;

    let snapshot = h.engine.snapshot(&tenant);
    assert_eq!(snapshot.status, SessionStatus::Ready);
    assert!(snapshot.qr_payload.is_none(), "payload cleared on leaving waiting_qr");
}

#[tokio::test(start_paused = true)]
async fn initialize_failure_resets_to_error_and_clears_credentials() {
    let h = harness();
    let tenant = TenantId::from("acme");
    h.credentials.seed(&tenant);
    h.factory.set_fail_initialize(true);

    let snapshot = h.engine.connect(&tenant).await;
    assert_eq!(snapshot.status, SessionStatus::Error);
    assert!(snapshot.last_error.is_some());
    assert!(h
        .credentials
        .deleted_tenants()
        .contains(&"acme".to_string()));
}

#[tokio::test(start_paused = true)]
async fn qr_timeout_resets_and_retries_with_incremented_attempts() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Qr("qr-one".into())).await;
    settle().await;

    // Let the pairing window (180 s) expire.
    tokio::time::sleep(Duration::from_secs(200)).await;

    let snapshot = h.engine.snapshot(&tenant);
    assert_eq!(snapshot.attempt_count, 1);
    // The auto-retry re-created the client.
    assert_eq!(h.factory.create_calls(), 2);

    // The state trail passed through idle between the reset and the retry.
    let trail = h.publisher.state_trail(&tenant);
    assert!(trail.contains(&SessionStatus::Idle));
}

#[tokio::test(start_paused = true)]
async fn third_qr_timeout_is_terminal_error() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    for round in 0..3 {
        let client = h.factory.client(&tenant).await.unwrap();
        client
            .emit(MessengerEvent::Qr(format!("qr-{round}")))
            .await;
        settle().await;
        tokio::time::sleep(Duration::from_secs(200)).await;
    }

    let snapshot = h.engine.snapshot(&tenant);
    assert_eq!(snapshot.status, SessionStatus::Error);
    assert_eq!(snapshot.attempt_count, 3);
    assert!(snapshot
        .last_error
        .as_deref()
        .unwrap_or_default()
        .contains("manual"));

    // No further retry was scheduled: three clients total.
    let creates = h.factory.create_calls();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(h.factory.create_calls(), creates);
}

#[tokio::test(start_paused = true)]
async fn acceptance_scenario_timeout_then_successful_pairing() {
    let h = harness();
    let tenant = TenantId::from("acme");

    // connect -> qr -> no scan within the window.
    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Qr("qr-one".into())).await;
    settle().await;
    tokio::time::sleep(Duration::from_secs(200)).await;

    // Auto-retry fired; this time the network confirms.
    assert_eq!(h.engine.snapshot(&tenant).attempt_count, 1);
    let client2 = h.factory.client(&tenant).await.unwrap();
    client2.emit(MessengerEvent::Ready).await;
    settle().await;

    let snapshot = h.engine.snapshot(&tenant);
    assert_eq!(snapshot.status, SessionStatus::Ready);
    assert!(snapshot.qr_payload.is_none());
    assert_eq!(snapshot.attempt_count, 0, "attempt counter reset on success");
}

#[tokio::test(start_paused = true)]
async fn pairing_credentials_are_persisted() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client
        .emit(MessengerEvent::Credentials {
            blob: b"opaque-session-blob".to_vec(),
        })
        .await;
    client.emit(MessengerEvent::Ready).await;
    settle().await;

    use courier_core::CredentialStore;
    assert!(h.credentials.exists(&tenant).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn transient_disconnect_schedules_one_auto_reconnect() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Ready).await;
    settle().await;

    client
        .emit(MessengerEvent::Disconnected {
            reason: "connection lost".into(),
        })
        .await;
    settle().await;

    let snapshot = h.engine.snapshot(&tenant);
    assert_eq!(snapshot.status, SessionStatus::Disconnected);
    assert_eq!(snapshot.last_error.as_deref(), Some("connection lost"));

    // After the fixed delay the engine reconnects with a fresh client.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.factory.create_calls(), 2);
    assert_eq!(
        h.engine.snapshot(&tenant).status,
        SessionStatus::Initializing
    );
}

#[tokio::test(start_paused = true)]
async fn logout_resets_credentials_and_does_not_reconnect() {
    let h = harness();
    let tenant = TenantId::from("acme");
    h.credentials.seed(&tenant);

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Ready).await;
    settle().await;

    client
        .emit(MessengerEvent::Disconnected {
            reason: "NAVIGATION: logged_out by user".into(),
        })
        .await;
    settle().await;

    // Full reset: credentials gone, state idle.
    assert!(h
        .credentials
        .deleted_tenants()
        .contains(&"acme".to_string()));
    assert_eq!(h.engine.snapshot(&tenant).status, SessionStatus::Idle);

    // No auto-reconnect fires, no matter how long we wait.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.factory.create_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_reconnect_during_shutdown() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Ready).await;
    settle().await;

    h.shutdown.cancel();
    client
        .emit(MessengerEvent::Disconnected {
            reason: "connection lost".into(),
        })
        .await;
    settle().await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.factory.create_calls(), 1, "no reconnect after shutdown");
}

#[tokio::test(start_paused = true)]
async fn disconnect_keeps_credentials_for_silent_resume() {
    let h = harness();
    let tenant = TenantId::from("acme");
    h.credentials.seed(&tenant);

    h.engine.connect(&tenant).await;
    h.engine.disconnect(&tenant).await;

    assert_eq!(
        h.engine.snapshot(&tenant).status,
        SessionStatus::Disconnected
    );
    assert!(
        h.credentials.deleted_tenants().is_empty(),
        "disconnect must not delete credentials"
    );
}

#[tokio::test(start_paused = true)]
async fn manual_reset_zeroes_the_attempt_counter() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Qr("qr-one".into())).await;
    settle().await;
    tokio::time::sleep(Duration::from_secs(200)).await;
    assert_eq!(h.engine.snapshot(&tenant).attempt_count, 1);

    h.engine.reset_session(&tenant, false).await;
    let snapshot = h.engine.snapshot(&tenant);
    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert_eq!(snapshot.attempt_count, 0);
}

#[tokio::test(start_paused = true)]
async fn fresh_connect_never_skips_initializing() {
    let h = harness();
    let tenant = TenantId::from("acme");

    h.engine.connect(&tenant).await;
    let client = h.factory.client(&tenant).await.unwrap();
    client.emit(MessengerEvent::Ready).await;
    settle().await;

    let trail = h.publisher.state_trail(&tenant);
    assert_eq!(trail.first(), Some(&SessionStatus::Initializing));
    assert_eq!(trail.last(), Some(&SessionStatus::Ready));
}

#[tokio::test(start_paused = true)]
async fn tenants_are_isolated() {
    let h = harness();
    let acme = TenantId::from("acme");
    let globex = TenantId::from("globex");

    h.engine.connect(&acme).await;
    h.engine.connect(&globex).await;

    let acme_client = h.factory.client(&acme).await.unwrap();
    acme_client.emit(MessengerEvent::Ready).await;
    settle().await;

    assert_eq!(h.engine.snapshot(&acme).status, SessionStatus::Ready);
    assert_eq!(
        h.engine.snapshot(&globex).status,
        SessionStatus::Initializing,
        "one tenant's events never touch another"
    );
}
