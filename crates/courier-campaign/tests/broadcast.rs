// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign broadcast behavior against the fake client and in-memory store.

use std::sync::Arc;
use std::time::Duration;

use courier_campaign::CampaignBroadcaster;
use courier_config::model::{CacheConfig, CampaignConfig, ResolverConfig};
use courier_core::types::{
    CampaignFilter, CampaignStatus, ContactRecord, CustomerRecord, DeliveryStatus, SessionStatus,
};
use courier_core::{DataStore, MessengerFactory, TenantId};
use courier_dispatch::{ChatIdResolver, MessageDispatcher};
use courier_session::SessionRegistry;
use courier_test_utils::{MemoryDataStore, MockMessenger, MockMessengerFactory};

struct Setup {
    broadcaster: CampaignBroadcaster,
    store: Arc<MemoryDataStore>,
    registry: Arc<SessionRegistry>,
    mock: Arc<MockMessenger>,
}

fn no_jitter() -> CampaignConfig {
    CampaignConfig {
        jitter_min_ms: 0,
        jitter_max_ms: 0,
        default_region_code: "20".to_string(),
    }
}

fn jitter(min_ms: u64, max_ms: u64) -> CampaignConfig {
    CampaignConfig {
        jitter_min_ms: min_ms,
        jitter_max_ms: max_ms,
        default_region_code: "20".to_string(),
    }
}

async fn setup(config: CampaignConfig) -> Setup {
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("acme");

    let factory = MockMessengerFactory::new();
    let (client, _rx) = factory.create(&tenant).await.unwrap();
    let session = registry.session(&tenant);
    session.set_client(client);
    session.with_state(|s| s.status = SessionStatus::Ready);

    let resolver = Arc::new(ChatIdResolver::new(
        Arc::clone(&registry),
        ResolverConfig::default(),
        &CacheConfig::default(),
    ));
    let dispatcher = Arc::new(MessageDispatcher::new(Arc::clone(&registry), resolver));
    let store = Arc::new(MemoryDataStore::new());

    Setup {
        broadcaster: CampaignBroadcaster::new(
            Arc::clone(&registry),
            dispatcher,
            store.clone(),
            config,
        ),
        store,
        registry,
        mock: factory.client(&tenant).await.unwrap(),
    }
}

async fn seed_customers(store: &MemoryDataStore, tenant: &TenantId, phones: &[(&str, &str)]) {
    for (phone, name) in phones {
        store
            .add_customer(
                tenant,
                CustomerRecord {
                    phone: phone.to_string(),
                    name: name.to_string(),
                    active: true,
                    segment: None,
                },
            )
            .await;
    }
}

#[tokio::test]
async fn empty_audience_completes_with_zero_total() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");

    let outcome = s
        .broadcaster
        .run(&tenant, "c1", "Hello {{name}}", &CampaignFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.status, CampaignStatus::Completed);
    assert_eq!(outcome.total, 0);
    assert_eq!(s.mock.sent_count().await, 0);
}

#[tokio::test]
async fn sends_to_every_matching_recipient() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    seed_customers(
        &s.store,
        &tenant,
        &[
            ("201001111111", "Samir"),
            ("201002222222", "Hala"),
            ("201003333333", "Omar"),
        ],
    )
    .await;

    let outcome = s
        .broadcaster
        .run(&tenant, "c1", "Hello {{name}}", &CampaignFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.status, CampaignStatus::Completed);
    assert_eq!(outcome.sent, 3);
    assert_eq!(outcome.failed, 0);
    assert_eq!(s.mock.sent_count().await, 3);

    // Each delivery was logged sent.
    for phone in ["201001111111", "201002222222", "201003333333"] {
        let (status, _) = s.store.delivery(&tenant, "c1", phone).await.unwrap();
        assert_eq!(status, DeliveryStatus::Sent);
    }
}

#[tokio::test]
async fn template_placeholders_reach_the_wire() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    seed_customers(&s.store, &tenant, &[("201001111111", "Samir")]).await;

    s.broadcaster
        .run(&tenant, "c1", "Hi {{name}}!", &CampaignFilter::All)
        .await
        .unwrap();

    let sent = s.mock.sent_messages().await;
    assert_eq!(sent.len(), 1);
    match &sent[0].content {
        courier_core::types::MessageContent::Text { body } => {
            assert_eq!(body, "Hi Samir!");
        }
        other => panic!("expected text content, got {other:?}"),
    }
}

#[tokio::test]
async fn audience_merges_customers_and_contacts_with_dedup() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    seed_customers(&s.store, &tenant, &[("201001111111", "Customer Name")]).await;
    // Same phone arrives later from the contact source with a fresher name.
    s.store
        .add_contact(
            &tenant,
            ContactRecord {
                phone: "+20 100 111 1111".to_string(),
                name: "Contact Name".to_string(),
                segment: None,
            },
        )
        .await;

    let outcome = s
        .broadcaster
        .run(&tenant, "c1", "Hi {{name}}", &CampaignFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.sent, 1, "duplicate phone deduplicated");
    let sent = s.mock.sent_messages().await;
    match &sent[0].content {
        courier_core::types::MessageContent::Text { body } => {
            assert_eq!(body, "Hi Contact Name", "last seen wins on duplicates");
        }
        other => panic!("expected text content, got {other:?}"),
    }
}

#[tokio::test]
async fn segment_filter_selects_only_matching() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    s.store
        .add_customer(
            &tenant,
            CustomerRecord {
                phone: "201001111111".into(),
                name: "Samir".into(),
                active: true,
                segment: Some("vip".into()),
            },
        )
        .await;
    s.store
        .add_customer(
            &tenant,
            CustomerRecord {
                phone: "201002222222".into(),
                name: "Hala".into(),
                active: true,
                segment: None,
            },
        )
        .await;

    let outcome = s
        .broadcaster
        .run(
            &tenant,
            "c1",
            "Hello {{name}}",
            &CampaignFilter::Segment { name: "vip".into() },
        )
        .await
        .unwrap();

    assert_eq!(outcome.sent, 1);
}

#[tokio::test]
async fn inactive_customers_are_excluded_by_active_filter() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    s.store
        .add_customer(
            &tenant,
            CustomerRecord {
                phone: "201001111111".into(),
                name: "Samir".into(),
                active: false,
                segment: None,
            },
        )
        .await;
    seed_customers(&s.store, &tenant, &[("201002222222", "Hala")]).await;

    let outcome = s
        .broadcaster
        .run(&tenant, "c1", "Hello", &CampaignFilter::Active)
        .await
        .unwrap();

    assert_eq!(outcome.sent, 1);
}

#[tokio::test]
async fn not_ready_session_fails_fast() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    seed_customers(&s.store, &tenant, &[("201001111111", "Samir")]).await;
    s.registry
        .session(&tenant)
        .with_state(|st| st.status = SessionStatus::Disconnected);

    let outcome = s
        .broadcaster
        .run(&tenant, "c1", "Hello", &CampaignFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.status, CampaignStatus::Failed);
    assert_eq!(s.mock.sent_count().await, 0);
}

#[tokio::test]
async fn resume_skips_previously_sent_recipients() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    seed_customers(
        &s.store,
        &tenant,
        &[
            ("201001111111", "Samir"),
            ("201002222222", "Hala"),
            ("201003333333", "Omar"),
        ],
    )
    .await;

    // A prior partial run already delivered to the first two.
    for phone in ["201001111111", "201002222222"] {
        s.store
            .append_delivery(&tenant, "c1", phone, DeliveryStatus::Sent, None)
            .await
            .unwrap();
    }

    let outcome = s
        .broadcaster
        .run(&tenant, "c1", "Hello {{name}}", &CampaignFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.status, CampaignStatus::Completed);
    assert_eq!(outcome.sent, 1, "only the remaining recipient is sent");
    assert_eq!(s.mock.sent_count().await, 1);
    let sent = s.mock.sent_messages().await;
    assert!(sent[0].chat.as_str().starts_with("201003333333"));

    // Prior success entries are intact.
    let sent_log = s.store.sent_phones(&tenant, "c1").await.unwrap();
    assert_eq!(sent_log.len(), 3);
}

#[tokio::test]
async fn failed_recipient_is_logged_and_loop_continues() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    seed_customers(
        &s.store,
        &tenant,
        &[("201001111111", "Samir"), ("201002222222", "Hala")],
    )
    .await;
    s.mock.set_fail_all_sends(true);

    let outcome = s
        .broadcaster
        .run(&tenant, "c1", "Hello", &CampaignFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.status, CampaignStatus::Completed);
    assert_eq!(outcome.sent, 0);
    assert_eq!(outcome.failed, 2);
    let (status, error) = s.store.delivery(&tenant, "c1", "201001111111").await.unwrap();
    assert_eq!(status, DeliveryStatus::Failed);
    assert!(error.is_some());
}

#[tokio::test]
async fn mid_run_session_drop_aborts_and_resume_continues() {
    let s = setup(jitter(20, 20)).await;
    let tenant = TenantId::from("acme");
    seed_customers(
        &s.store,
        &tenant,
        &[
            ("201001111111", "A"),
            ("201002222222", "B"),
            ("201003333333", "C"),
            ("201004444444", "D"),
            ("201005555555", "E"),
        ],
    )
    .await;

    let broadcaster = s.broadcaster;
    let registry = Arc::clone(&s.registry);
    let store = s.store.clone();
    let tenant_for_run = tenant.clone();
    let run = tokio::spawn(async move {
        broadcaster
            .run(&tenant_for_run, "c1", "Hello", &CampaignFilter::All)
            .await
            .unwrap()
    });

    // Drop the session once two deliveries are logged.
    loop {
        tokio::time::sleep(Duration::from_millis(2)).await;
        if store.sent_phones(&tenant, "c1").await.unwrap().len() >= 2 {
            registry
                .session(&tenant)
                .with_state(|st| st.status = SessionStatus::Disconnected);
            break;
        }
    }

    let outcome = run.await.unwrap();
    assert_eq!(outcome.status, CampaignStatus::Failed);
    assert!(outcome.sent >= 2);
    assert!(outcome.sent < 5, "run stopped before the full audience");
    assert!(outcome
        .message
        .as_deref()
        .unwrap_or_default()
        .contains("reconnect"));

    // Reconnect and resume: continues after the last logged recipient,
    // never re-sending 1..k.
    s.registry
        .session(&tenant)
        .with_state(|st| st.status = SessionStatus::Ready);
    let resolver = Arc::new(ChatIdResolver::new(
        Arc::clone(&s.registry),
        ResolverConfig::default(),
        &CacheConfig::default(),
    ));
    let dispatcher = Arc::new(MessageDispatcher::new(Arc::clone(&s.registry), resolver));
    let resumed = CampaignBroadcaster::new(
        Arc::clone(&s.registry),
        dispatcher,
        s.store.clone(),
        no_jitter(),
    );

    let outcome = resumed
        .run(&tenant, "c1", "Hello", &CampaignFilter::All)
        .await
        .unwrap();
    assert_eq!(outcome.status, CampaignStatus::Completed);

    // Every recipient was delivered exactly once across both runs.
    assert_eq!(s.mock.sent_count().await, 5);
    assert_eq!(s.store.sent_phones(&tenant, "c1").await.unwrap().len(), 5);
}

#[tokio::test]
async fn progress_counters_are_persisted() {
    let s = setup(no_jitter()).await;
    let tenant = TenantId::from("acme");
    seed_customers(&s.store, &tenant, &[("201001111111", "Samir")]).await;

    s.broadcaster
        .run(&tenant, "c1", "Hello", &CampaignFilter::All)
        .await
        .unwrap();

    let run = s.store.campaign_run(&tenant, "c1").await.unwrap();
    assert_eq!(run.status, CampaignStatus::Completed);
    assert_eq!(run.sent, 1);
    assert_eq!(run.failed, 0);
}
