// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of the messaging-client capability.
//!
//! Each tenant maps to one instance on the client-host service. Commands go
//! out as HTTP calls; events come back through the ingest endpoint (see
//! [`crate::ingest`]) and are forwarded into the tenant's bounded queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use courier_core::traits::messenger::EVENT_QUEUE_CAPACITY;
use courier_core::types::{ChatId, MessageContent, MessengerEvent, SendOptions, TenantId};
use courier_core::{CourierError, MessengerClient, MessengerFactory, RemoteChat};
use courier_config::model::BridgeConfig;

/// Shared HTTP plumbing for the bridge.
struct BridgeShared {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BridgeShared {
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .request(method, format!("{}{path}", self.base_url));
        if let Some(ref key) = self.api_key {
            request = request.header("X-Api-Key", key);
        }
        request
    }
}

fn map_http(context: &str, e: reqwest::Error) -> CourierError {
    CourierError::Messenger {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn expect_success(
    context: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, CourierError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CourierError::Messenger {
        message: format!("{context}: client host returned {status}: {body}"),
        source: None,
    })
}

/// One tenant's client instance on the host service.
pub struct HttpMessengerClient {
    shared: Arc<BridgeShared>,
    tenant: TenantId,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    canonical: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    id: String,
}

impl HttpMessengerClient {
    fn instance_path(&self, suffix: &str) -> String {
        format!("/instances/{}{suffix}", self.tenant.as_str())
    }

    async fn post_send(
        &self,
        path: &str,
        chat: &ChatId,
        content: &MessageContent,
        opts: &SendOptions,
    ) -> Result<String, CourierError> {
        let body = serde_json::json!({
            "chat_id": chat.as_str(),
            "content": content,
            "quoted_message_id": opts.quoted_message_id,
        });
        let response = self
            .shared
            .request(reqwest::Method::POST, path)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_http("send", e))?;
        let response = expect_success("send", response).await?;
        let parsed: SendResponse = response.json().await.map_err(|e| map_http("send", e))?;
        Ok(parsed.message_id)
    }
}

#[async_trait]
impl MessengerClient for HttpMessengerClient {
    async fn initialize(&self) -> Result<(), CourierError> {
        let response = self
            .shared
            .request(reqwest::Method::POST, &self.instance_path("/connect"))
            .send()
            .await
            .map_err(|e| map_http("initialize", e))?;
        expect_success("initialize", response).await?;
        debug!(tenant = %self.tenant, "client host instance starting");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), CourierError> {
        let response = self
            .shared
            .request(reqwest::Method::POST, &self.instance_path("/destroy"))
            .send()
            .await
            .map_err(|e| map_http("destroy", e))?;
        expect_success("destroy", response).await?;
        Ok(())
    }

    async fn send_message(
        &self,
        chat: &ChatId,
        content: &MessageContent,
        opts: &SendOptions,
    ) -> Result<String, CourierError> {
        self.post_send(&self.instance_path("/messages"), chat, content, opts)
            .await
    }

    async fn get_chat_by_id(
        &self,
        chat: &ChatId,
    ) -> Result<Box<dyn RemoteChat>, CourierError> {
        let path = self.instance_path(&format!("/chats/{}", chat.as_str()));
        let response = self
            .shared
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|e| map_http("chat fetch", e))?;
        let response = expect_success("chat fetch", response).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| map_http("chat fetch", e))?;
        Ok(Box::new(HttpRemoteChat {
            shared: Arc::clone(&self.shared),
            tenant: self.tenant.clone(),
            id: ChatId(parsed.id),
        }))
    }

    async fn validate_number(&self, digits: &str) -> Result<Option<ChatId>, CourierError> {
        let response = self
            .shared
            .request(
                reqwest::Method::POST,
                &self.instance_path("/numbers/validate"),
            )
            .json(&serde_json::json!({ "digits": digits }))
            .send()
            .await
            .map_err(|e| map_http("validate", e))?;
        let response = expect_success("validate", response).await?;
        let parsed: ValidateResponse =
            response.json().await.map_err(|e| map_http("validate", e))?;
        Ok(parsed.canonical.map(ChatId))
    }
}

/// Chat object fetched from the host; sends through the chat-scoped route.
struct HttpRemoteChat {
    shared: Arc<BridgeShared>,
    tenant: TenantId,
    id: ChatId,
}

#[async_trait]
impl RemoteChat for HttpRemoteChat {
    fn id(&self) -> &ChatId {
        &self.id
    }

    async fn send(
        &self,
        content: &MessageContent,
        opts: &SendOptions,
    ) -> Result<String, CourierError> {
        let path = format!(
            "/instances/{}/chats/{}/messages",
            self.tenant.as_str(),
            self.id.as_str()
        );
        let body = serde_json::json!({
            "content": content,
            "quoted_message_id": opts.quoted_message_id,
        });
        let response = self
            .shared
            .request(reqwest::Method::POST, &path)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_http("chat send", e))?;
        let response = expect_success("chat send", response).await?;
        let parsed: SendResponse =
            response.json().await.map_err(|e| map_http("chat send", e))?;
        Ok(parsed.message_id)
    }
}

/// Factory creating one [`HttpMessengerClient`] per tenant and retaining
/// the event sender the ingest endpoint feeds.
pub struct HttpMessengerFactory {
    shared: Arc<BridgeShared>,
    event_senders: DashMap<String, mpsc::Sender<MessengerEvent>>,
}

impl HttpMessengerFactory {
    pub fn new(config: &BridgeConfig) -> Result<Self, CourierError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CourierError::Config("bridge.base_url is not set".to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CourierError::Config(format!("bridge http client: {e}")))?;
        Ok(Self {
            shared: Arc::new(BridgeShared {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
            event_senders: DashMap::new(),
        })
    }

    /// Forward an event from the client host into the tenant's queue.
    ///
    /// Returns false when the tenant has no live session (the event is
    /// dropped; the host retries on its own schedule).
    pub async fn ingest(&self, tenant: &TenantId, event: MessengerEvent) -> bool {
        let Some(sender) = self
            .event_senders
            .get(tenant.as_str())
            .map(|entry| entry.clone())
        else {
            warn!(tenant = %tenant, "event for tenant without a live session dropped");
            return false;
        };
        sender.send(event).await.is_ok()
    }
}

#[async_trait]
impl MessengerFactory for HttpMessengerFactory {
    async fn create(
        &self,
        tenant: &TenantId,
    ) -> Result<(Arc<dyn MessengerClient>, mpsc::Receiver<MessengerEvent>), CourierError> {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        self.event_senders
            .insert(tenant.as_str().to_string(), tx);
        let client = Arc::new(HttpMessengerClient {
            shared: Arc::clone(&self.shared),
            tenant: tenant.clone(),
        });
        Ok((client, rx))
    }
}
