// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message dispatch with resolve-then-send semantics.
//!
//! Text sends retry once through an alternate path (fetch the chat object,
//! then send) because the network occasionally rejects the fast path for
//! reasons unrelated to recipient validity. Structured messages have no
//! safe alternate delivery method, so their failures surface immediately.
//! Retry policy for bulk sends belongs to the campaign broadcaster, not
//! here.

use std::sync::Arc;

use tracing::warn;

use courier_core::types::{ChatId, ListSection, MessageContent, SendOptions, SessionStatus};
use courier_core::{CourierError, MessengerClient, TenantId};
use courier_session::SessionRegistry;

use crate::resolver::ChatIdResolver;

/// Structured message kinds with no alternate delivery path.
#[derive(Debug, Clone)]
pub enum StructuredMessage {
    Buttons {
        body: String,
        buttons: Vec<String>,
    },
    List {
        body: String,
        button_text: String,
        sections: Vec<ListSection>,
    },
    ContactCard {
        name: String,
        phone: String,
    },
}

impl StructuredMessage {
    fn into_content(self) -> MessageContent {
        match self {
            StructuredMessage::Buttons { body, buttons } => {
                MessageContent::Buttons { body, buttons }
            }
            StructuredMessage::List {
                body,
                button_text,
                sections,
            } => MessageContent::List {
                body,
                button_text,
                sections,
            },
            StructuredMessage::ContactCard { name, phone } => {
                MessageContent::ContactCard { name, phone }
            }
        }
    }
}

pub struct MessageDispatcher {
    registry: Arc<SessionRegistry>,
    resolver: Arc<ChatIdResolver>,
}

impl MessageDispatcher {
    pub fn new(registry: Arc<SessionRegistry>, resolver: Arc<ChatIdResolver>) -> Self {
        Self { registry, resolver }
    }

    pub fn resolver(&self) -> &Arc<ChatIdResolver> {
        &self.resolver
    }

    /// Send a text message, optionally quoting an earlier one.
    ///
    /// Returns the network-assigned message id.
    pub async fn send_text(
        &self,
        tenant: &TenantId,
        to: &str,
        text: &str,
        quoted_message_id: Option<String>,
    ) -> Result<String, CourierError> {
        let client = self.ready_client(tenant)?;
        let chat = self.resolver.resolve(tenant, to).await?;
        let content = MessageContent::text(text);
        let opts = SendOptions { quoted_message_id };

        match client.send_message(&chat, &content, &opts).await {
            Ok(id) => Ok(id),
            Err(first) => {
                warn!(
                    tenant = %tenant,
                    chat = %chat,
                    error = %first,
                    "direct send rejected, retrying via chat fetch"
                );
                self.send_via_chat(client.as_ref(), &chat, &content, &opts)
                    .await
            }
        }
    }

    /// Send a media attachment. Media sends are less tolerant of malformed
    /// identifiers than text sends, so the resolved id must pass the strict
    /// validity check.
    pub async fn send_media(
        &self,
        tenant: &TenantId,
        to: &str,
        mime_type: &str,
        data: &str,
        filename: Option<String>,
        caption: Option<String>,
    ) -> Result<String, CourierError> {
        let client = self.ready_client(tenant)?;
        let chat = self.resolver.resolve(tenant, to).await?;
        if !self.resolver.is_strict_valid(&chat) {
            return Err(CourierError::InvalidRecipient(chat.as_str().to_string()));
        }

        let content = MessageContent::Media {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
            filename,
            caption,
        };
        client
            .send_message(&chat, &content, &SendOptions::default())
            .await
            .map_err(|e| CourierError::Messenger {
                message: "the attachment could not be delivered; check the recipient and try again"
                    .to_string(),
                source: Some(Box::new(e)),
            })
    }

    /// Send a button menu, list menu, or contact card. No fallback path.
    pub async fn send_structured(
        &self,
        tenant: &TenantId,
        to: &str,
        message: StructuredMessage,
    ) -> Result<String, CourierError> {
        let client = self.ready_client(tenant)?;
        let chat = self.resolver.resolve(tenant, to).await?;
        client
            .send_message(&chat, &message.into_content(), &SendOptions::default())
            .await
    }

    /// The live client, required to be `Ready`.
    ///
    /// Fails fast with a distinguishable error so callers prompt a
    /// reconnect instead of retrying blindly.
    fn ready_client(&self, tenant: &TenantId) -> Result<Arc<dyn MessengerClient>, CourierError> {
        let status = self.registry.status(tenant);
        if status != SessionStatus::Ready {
            return Err(CourierError::NotReady { status });
        }
        self.registry
            .client(tenant)
            .ok_or(CourierError::NotReady { status })
    }

    async fn send_via_chat(
        &self,
        client: &dyn MessengerClient,
        chat: &ChatId,
        content: &MessageContent,
        opts: &SendOptions,
    ) -> Result<String, CourierError> {
        let attempt = async {
            let remote = client.get_chat_by_id(chat).await?;
            remote.send(content, opts).await
        };
        attempt.await.map_err(|e| CourierError::Messenger {
            message: format!("message could not be delivered to {chat}"),
            source: Some(Box::new(e)),
        })
    }
}
