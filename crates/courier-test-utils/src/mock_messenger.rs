// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic fake messaging client.
//!
//! `MockMessenger` implements `MessengerClient` with injectable events and
//! captured sends, so the session state machine, dispatcher, and broadcaster
//! can be exercised without a live network. The factory hands out one mock
//! per tenant and keeps a handle for event injection from the test body.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use courier_core::traits::messenger::EVENT_QUEUE_CAPACITY;
use courier_core::types::{ChatId, MessageContent, MessengerEvent, SendOptions};
use courier_core::{CourierError, MessengerClient, MessengerFactory, RemoteChat, TenantId};

/// One captured outbound send.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat: ChatId,
    pub content: MessageContent,
    pub quoted_message_id: Option<String>,
    /// True when the send went through the fetched-chat fallback path.
    pub via_chat_object: bool,
}

/// A scripted fake of the external messaging client.
pub struct MockMessenger {
    tenant: TenantId,
    events_tx: mpsc::Sender<MessengerEvent>,
    /// Shared with chat handles so fallback sends land in the same log.
    sent: Arc<Mutex<Vec<SentMessage>>>,
    initialize_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
    fail_initialize: AtomicBool,
    fail_direct_send: AtomicBool,
    fail_all_sends: AtomicBool,
    /// digits -> canonical chat id returned by validate_number.
    known_numbers: Mutex<HashMap<String, String>>,
}

impl MockMessenger {
    fn new(tenant: TenantId, events_tx: mpsc::Sender<MessengerEvent>) -> Self {
        Self {
            tenant,
            events_tx,
            sent: Arc::new(Mutex::new(Vec::new())),
            initialize_calls: AtomicUsize::new(0),
            destroy_calls: AtomicUsize::new(0),
            fail_initialize: AtomicBool::new(false),
            fail_direct_send: AtomicBool::new(false),
            fail_all_sends: AtomicBool::new(false),
            known_numbers: Mutex::new(HashMap::new()),
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Inject an event as if the network emitted it.
    pub async fn emit(&self, event: MessengerEvent) {
        let _ = self.events_tx.send(event).await;
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn destroy_calls(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    /// Make `initialize` fail until cleared.
    pub fn set_fail_initialize(&self, fail: bool) {
        self.fail_initialize.store(fail, Ordering::SeqCst);
    }

    /// Make direct sends fail while the fetched-chat path still works.
    pub fn set_fail_direct_send(&self, fail: bool) {
        self.fail_direct_send.store(fail, Ordering::SeqCst);
    }

    /// Make every send path fail.
    pub fn set_fail_all_sends(&self, fail: bool) {
        self.fail_all_sends.store(fail, Ordering::SeqCst);
    }

    /// Teach validate_number a digits -> canonical id mapping.
    pub async fn add_known_number(&self, digits: &str, canonical: &str) {
        self.known_numbers
            .lock()
            .await
            .insert(digits.to_string(), canonical.to_string());
    }

    async fn record_send(
        &self,
        chat: &ChatId,
        content: &MessageContent,
        opts: &SendOptions,
        via_chat_object: bool,
    ) -> String {
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(SentMessage {
            chat: chat.clone(),
            content: content.clone(),
            quoted_message_id: opts.quoted_message_id.clone(),
            via_chat_object,
        });
        id
    }
}

#[async_trait]
impl MessengerClient for MockMessenger {
    async fn initialize(&self) -> Result<(), CourierError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(CourierError::messenger("mock initialize failure"));
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), CourierError> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_message(
        &self,
        chat: &ChatId,
        content: &MessageContent,
        opts: &SendOptions,
    ) -> Result<String, CourierError> {
        if self.fail_all_sends.load(Ordering::SeqCst)
            || self.fail_direct_send.load(Ordering::SeqCst)
        {
            return Err(CourierError::messenger("mock direct send failure"));
        }
        Ok(self.record_send(chat, content, opts, false).await)
    }

    async fn get_chat_by_id(
        &self,
        chat: &ChatId,
    ) -> Result<Box<dyn RemoteChat>, CourierError> {
        if self.fail_all_sends.load(Ordering::SeqCst) {
            return Err(CourierError::messenger("mock chat fetch failure"));
        }
        Ok(Box::new(MockChatHandle {
            id: chat.clone(),
            owner: Arc::clone(&self.sent),
            fail: self.fail_all_sends.load(Ordering::SeqCst),
        }))
    }

    async fn validate_number(&self, digits: &str) -> Result<Option<ChatId>, CourierError> {
        Ok(self
            .known_numbers
            .lock()
            .await
            .get(digits)
            .map(|id| ChatId(id.clone())))
    }
}

struct MockChatHandle {
    id: ChatId,
    owner: Arc<Mutex<Vec<SentMessage>>>,
    fail: bool,
}

#[async_trait]
impl RemoteChat for MockChatHandle {
    fn id(&self) -> &ChatId {
        &self.id
    }

    async fn send(
        &self,
        content: &MessageContent,
        opts: &SendOptions,
    ) -> Result<String, CourierError> {
        if self.fail {
            return Err(CourierError::messenger("mock chat send failure"));
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.owner.lock().await.push(SentMessage {
            chat: self.id.clone(),
            content: content.clone(),
            quoted_message_id: opts.quoted_message_id.clone(),
            via_chat_object: true,
        });
        Ok(id)
    }
}

/// Factory that creates one [`MockMessenger`] per tenant and retains a
/// handle for test-side event injection.
#[derive(Default)]
pub struct MockMessengerFactory {
    clients: Mutex<HashMap<String, Arc<MockMessenger>>>,
    fail_initialize: AtomicBool,
    create_calls: AtomicUsize,
}

impl MockMessengerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the mock created for `tenant`, if any.
    pub async fn client(&self, tenant: &TenantId) -> Option<Arc<MockMessenger>> {
        self.clients.lock().await.get(tenant.as_str()).cloned()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Newly created clients will fail `initialize` until cleared.
    pub fn set_fail_initialize(&self, fail: bool) {
        self.fail_initialize.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessengerFactory for MockMessengerFactory {
    async fn create(
        &self,
        tenant: &TenantId,
    ) -> Result<(Arc<dyn MessengerClient>, mpsc::Receiver<MessengerEvent>), CourierError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let mock = Arc::new(MockMessenger::new(tenant.clone(), tx));
        if self.fail_initialize.load(Ordering::SeqCst) {
            mock.set_fail_initialize(true);
        }
        self.clients
            .lock()
            .await
            .insert(tenant.as_str().to_string(), Arc::clone(&mock));
        Ok((mock, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn factory_hands_out_per_tenant_clients() {
        let factory = MockMessengerFactory::new();
        let tenant = TenantId::from("acme");
        let (client, _rx) = factory.create(&tenant).await.unwrap();
        client.initialize().await.unwrap();

        let handle = factory.client(&tenant).await.unwrap();
        assert_eq!(handle.initialize_calls(), 1);
    }

    #[tokio::test]
    async fn emitted_events_reach_the_receiver() {
        let factory = MockMessengerFactory::new();
        let tenant = TenantId::from("acme");
        let (_client, mut rx) = factory.create(&tenant).await.unwrap();
        let handle = factory.client(&tenant).await.unwrap();

        handle.emit(MessengerEvent::Qr("qr-data".into())).await;
        match rx.recv().await.unwrap() {
            MessengerEvent::Qr(payload) => assert_eq!(payload, "qr-data"),
            other => panic!("expected Qr, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn direct_send_failure_leaves_chat_path_working() {
        let factory = MockMessengerFactory::new();
        let tenant = TenantId::from("acme");
        let (client, _rx) = factory.create(&tenant).await.unwrap();
        let handle = factory.client(&tenant).await.unwrap();
        handle.set_fail_direct_send(true);

        let chat = ChatId("201001234567@c.us".to_string());
        let content = MessageContent::text("hello");
        let opts = SendOptions::default();

        assert!(client.send_message(&chat, &content, &opts).await.is_err());

        let remote = client.get_chat_by_id(&chat).await.unwrap();
        remote.send(&content, &opts).await.unwrap();

        let sent = handle.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].via_chat_object);
    }

    #[tokio::test]
    async fn validate_number_uses_taught_mapping() {
        let factory = MockMessengerFactory::new();
        let tenant = TenantId::from("acme");
        let (client, _rx) = factory.create(&tenant).await.unwrap();
        let handle = factory.client(&tenant).await.unwrap();
        handle
            .add_known_number("201001234567", "201001234567@c.us")
            .await;

        let canonical = client.validate_number("201001234567").await.unwrap();
        assert_eq!(canonical.unwrap().as_str(), "201001234567@c.us");
        assert!(client.validate_number("999").await.unwrap().is_none());
    }
}
