// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event routing: persistence, realtime notification, webhooks,
//! and downstream automation.
//!
//! Events for one tenant are drained in order from a bounded queue (see the
//! engine's pump task). Every handler catches and logs its own failures so
//! one tenant's bad event never takes the process down.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use courier_core::types::{
    AckStatus, IncomingMessage, MessageDirection, MessageRecord, TenantEvent, WebhookPayload,
};
use courier_core::{AutomationHook, CourierError, DataStore, RealtimePublisher, TenantId};
use courier_config::model::{ResolverConfig, SessionConfig};
use courier_webhook::WebhookNotifier;

use crate::assign::AutoAssignCoordinator;

/// Routes one tenant session's inbound protocol events.
pub struct EventRouter {
    store: Arc<dyn DataStore>,
    publisher: Arc<dyn RealtimePublisher>,
    webhook: Arc<WebhookNotifier>,
    automation: Arc<dyn AutomationHook>,
    assigner: Arc<AutoAssignCoordinator>,
    resolver: ResolverConfig,
    automation_delay: Duration,
}

impl EventRouter {
    pub fn new(
        store: Arc<dyn DataStore>,
        publisher: Arc<dyn RealtimePublisher>,
        webhook: Arc<WebhookNotifier>,
        automation: Arc<dyn AutomationHook>,
        resolver: ResolverConfig,
        session: &SessionConfig,
    ) -> Self {
        let assigner = Arc::new(AutoAssignCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&publisher),
        ));
        Self {
            store,
            publisher,
            webhook,
            automation,
            assigner,
            resolver,
            automation_delay: Duration::from_millis(session.automation_delay_ms),
        }
    }

    /// Handle one inbound message: reconcile identity, upsert, notify.
    pub async fn on_message(
        &self,
        tenant: &TenantId,
        message: IncomingMessage,
    ) -> Result<(), CourierError> {
        let phone = self.best_phone(&message);

        let conversation = self
            .store
            .resolve_conversation(tenant, &phone, message.sender_name.as_deref())
            .await?;

        // Self-healing: the network can reveal a better identity over time
        // than was available at first contact.
        if conversation.customer_phone != phone
            && self.looks_wrong(&conversation.customer_phone)
            && !self.looks_wrong(&phone)
        {
            info!(
                tenant = %tenant,
                conversation = %conversation.id,
                old = %conversation.customer_phone,
                new = %phone,
                "healing stored customer phone"
            );
            self.store
                .update_conversation_phone(tenant, &conversation.id, &phone)
                .await?;
        }

        let record = MessageRecord {
            external_id: message.id.clone(),
            tenant_id: tenant.clone(),
            direction: MessageDirection::Inbound,
            chat_id: message.chat_id.clone(),
            from: message.from.clone(),
            to: message.to.clone(),
            body: message.content.body_text(),
            content: message.content.clone(),
            quoted_id: message.quoted_id.clone(),
            ack: AckStatus::Pending,
            reactions: Vec::new(),
            timestamp: message.timestamp,
        };

        // Keyed by the network's message id: redelivery updates, never duplicates.
        self.store.upsert_message(&record).await?;

        self.publisher
            .publish(tenant, TenantEvent::Message(record.clone()));

        // Fire-and-forget: webhook failure must not block persistence or
        // notification. The notifier logs its own exhaustion.
        {
            let webhook = Arc::clone(&self.webhook);
            let tenant = tenant.clone();
            let payload = WebhookPayload {
                event: "message".to_string(),
                tenant_id: tenant.as_str().to_string(),
                from: record.from.clone(),
                to: record.to.clone(),
                body: record.body.clone(),
                timestamp: record.timestamp,
                message_id: record.external_id.clone(),
            };
            tokio::spawn(async move {
                let _ = webhook.notify(&tenant, &payload).await;
            });
        }

        // Downstream automation after a short delay, to avoid racing the
        // sender's own echo.
        {
            let assigner = Arc::clone(&self.assigner);
            let automation = Arc::clone(&self.automation);
            let delay = self.automation_delay;
            let tenant = tenant.clone();
            let record = record.clone();
            let conversation = conversation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = assigner.maybe_assign(&tenant, &conversation).await {
                    warn!(tenant = %tenant, error = %e, "auto-assign failed");
                }
                automation.on_message(&tenant, &record).await;
            });
        }

        Ok(())
    }

    /// Delivery receipt: update the stored record's status in place.
    pub async fn on_ack(
        &self,
        tenant: &TenantId,
        message_id: &str,
        raw_code: i32,
    ) -> Result<(), CourierError> {
        let status = AckStatus::from_raw(raw_code);
        self.store
            .update_message_ack(tenant, message_id, status)
            .await?;
        self.publisher.publish(
            tenant,
            TenantEvent::MessageAck {
                message_id: message_id.to_string(),
                status,
                raw: raw_code,
            },
        );
        Ok(())
    }

    /// Reaction added or removed (empty text) on a stored record.
    pub async fn on_reaction(
        &self,
        tenant: &TenantId,
        message_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<(), CourierError> {
        let reactions = self
            .store
            .apply_message_reaction(tenant, message_id, sender, text)
            .await?;
        self.publisher.publish(
            tenant,
            TenantEvent::Reaction {
                message_id: message_id.to_string(),
                reactions,
            },
        );
        Ok(())
    }

    /// Best canonical phone for the sender, via the reconciliation fallback
    /// chain: formatted number, raw number, then the chat id's user part.
    /// Falls back to the user part even when it looks wrong, so the message
    /// is never dropped over identity doubts.
    fn best_phone(&self, message: &IncomingMessage) -> String {
        let candidates = [
            message.formatted_phone.as_deref(),
            message.raw_phone.as_deref(),
            Some(message.from.as_str()),
        ];

        let mut first_nonempty: Option<String> = None;
        for candidate in candidates.into_iter().flatten() {
            let digits: String = candidate.chars().filter(char::is_ascii_digit).collect();
            if digits.is_empty() {
                continue;
            }
            if first_nonempty.is_none() {
                first_nonempty = Some(digits.clone());
            }
            if !self.looks_wrong(&digits) {
                return digits;
            }
        }
        first_nonempty.unwrap_or_default()
    }

    /// A stored phone "looks wrong" when its digit count falls outside the
    /// configured bounds or it carries a network-internal prefix.
    fn looks_wrong(&self, phone: &str) -> bool {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        digits.len() < self.resolver.min_phone_digits
            || digits.len() > self.resolver.max_phone_digits
            || self
                .resolver
                .internal_prefixes
                .iter()
                .any(|prefix| digits.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use courier_core::types::{ChatId, MessageContent};
    use courier_core::NullAutomation;
    use courier_test_utils::{MemoryDataStore, RecordingPublisher};

    fn make_router(
        store: Arc<MemoryDataStore>,
        publisher: Arc<RecordingPublisher>,
    ) -> Arc<EventRouter> {
        let webhook = Arc::new(WebhookNotifier::new(
            &courier_config::model::WebhookConfig::default(),
            store.clone(),
        ));
        Arc::new(EventRouter::new(
            store,
            publisher,
            webhook,
            Arc::new(NullAutomation),
            ResolverConfig::default(),
            &SessionConfig {
                automation_delay_ms: 0,
                ..SessionConfig::default()
            },
        ))
    }

    fn incoming(id: &str, from: &str) -> IncomingMessage {
        IncomingMessage {
            id: id.to_string(),
            chat_id: ChatId(from.to_string()),
            from: from.to_string(),
            to: "201009999999@c.us".to_string(),
            content: MessageContent::text("hello"),
            quoted_id: None,
            sender_name: Some("Samir".to_string()),
            formatted_phone: None,
            raw_phone: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_message_id_updates_not_duplicates() {
        let store = Arc::new(MemoryDataStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let router = make_router(store.clone(), publisher);
        let tenant = TenantId::from("acme");

        router
            .on_message(&tenant, incoming("m1", "201001234567@c.us"))
            .await
            .unwrap();
        router
            .on_message(&tenant, incoming("m1", "201001234567@c.us"))
            .await
            .unwrap();

        assert_eq!(store.message_count().await, 1);
    }

    #[tokio::test]
    async fn reconciliation_prefers_formatted_phone() {
        let store = Arc::new(MemoryDataStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let router = make_router(store.clone(), publisher);
        let tenant = TenantId::from("acme");

        let mut message = incoming("m1", "120363000000001234@g.us");
        message.formatted_phone = Some("+20 100 123 4567".to_string());
        router.on_message(&tenant, message).await.unwrap();

        let conversations = store.conversations(&tenant).await;
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].customer_phone, "201001234567");
    }

    #[tokio::test]
    async fn stored_internal_phone_is_healed() {
        let store = Arc::new(MemoryDataStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let router = make_router(store.clone(), publisher);
        let tenant = TenantId::from("acme");

        // First contact only knew the internal identifier.
        router
            .on_message(&tenant, incoming("m1", "120363000000001234@g.us"))
            .await
            .unwrap();
        let before = store.conversations(&tenant).await;
        assert_eq!(before[0].customer_phone, "120363000000001234");

        // Later event carries the real number; the stored phone heals.
        let mut message = incoming("m2", "120363000000001234@g.us");
        message.raw_phone = Some("201001234567".to_string());
        router.on_message(&tenant, message).await.unwrap();

        let after = store.conversations(&tenant).await;
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].customer_phone, "201001234567");
    }

    #[tokio::test]
    async fn ack_updates_record_and_publishes() {
        let store = Arc::new(MemoryDataStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let router = make_router(store.clone(), publisher.clone());
        let tenant = TenantId::from("acme");

        router
            .on_message(&tenant, incoming("m1", "201001234567@c.us"))
            .await
            .unwrap();
        router.on_ack(&tenant, "m1", 3).await.unwrap();

        let record = store.message(&tenant, "m1").await.unwrap();
        assert_eq!(record.ack, AckStatus::Read);

        let acks: Vec<_> = publisher
            .events()
            .into_iter()
            .filter(|(_, e)| matches!(e, TenantEvent::MessageAck { .. }))
            .collect();
        assert_eq!(acks.len(), 1);
    }

    #[tokio::test]
    async fn reaction_add_and_remove_round_trip() {
        let store = Arc::new(MemoryDataStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let router = make_router(store.clone(), publisher);
        let tenant = TenantId::from("acme");

        router
            .on_message(&tenant, incoming("m1", "201001234567@c.us"))
            .await
            .unwrap();
        router
            .on_reaction(&tenant, "m1", "peer@c.us", "\u{1F44D}")
            .await
            .unwrap();
        assert_eq!(store.message(&tenant, "m1").await.unwrap().reactions.len(), 1);

        router.on_reaction(&tenant, "m1", "peer@c.us", "").await.unwrap();
        assert!(store.message(&tenant, "m1").await.unwrap().reactions.is_empty());
    }

    #[tokio::test]
    async fn message_event_is_published_per_tenant() {
        let store = Arc::new(MemoryDataStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let router = make_router(store, publisher.clone());

        router
            .on_message(&TenantId::from("acme"), incoming("m1", "201001234567@c.us"))
            .await
            .unwrap();

        let events = publisher.events();
        assert!(events
            .iter()
            .any(|(t, e)| t.as_str() == "acme" && matches!(e, TenantEvent::Message(_))));
    }
}
