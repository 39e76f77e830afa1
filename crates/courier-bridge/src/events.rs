// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire envelope for events posted by the client-host service.
//!
//! The envelope mirrors the client host's own event stream; Courier maps
//! it onto [`MessengerEvent`] and stays ignorant of the network protocol
//! underneath.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use courier_core::types::{ChatId, IncomingMessage, MessageContent, MessengerEvent};

/// One event as posted to the ingest endpoint.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    Qr {
        payload: String,
    },
    Ready,
    /// Base64-encoded credential blob to persist for silent resume.
    Credentials {
        blob: String,
    },
    AuthFailure {
        reason: String,
    },
    Disconnected {
        reason: String,
    },
    Message {
        id: String,
        chat_id: String,
        from: String,
        to: String,
        #[serde(default)]
        body: String,
        #[serde(default)]
        mime_type: Option<String>,
        #[serde(default)]
        media_data: Option<String>,
        #[serde(default)]
        filename: Option<String>,
        #[serde(default)]
        quoted_id: Option<String>,
        #[serde(default)]
        sender_name: Option<String>,
        #[serde(default)]
        formatted_phone: Option<String>,
        #[serde(default)]
        raw_phone: Option<String>,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    MessageAck {
        message_id: String,
        ack: i32,
    },
    Reaction {
        message_id: String,
        sender: String,
        #[serde(default)]
        text: String,
    },
}

impl From<BridgeEvent> for MessengerEvent {
    fn from(event: BridgeEvent) -> Self {
        match event {
            BridgeEvent::Qr { payload } => MessengerEvent::Qr(payload),
            BridgeEvent::Ready => MessengerEvent::Ready,
            BridgeEvent::Credentials { blob } => MessengerEvent::Credentials {
                // An undecodable blob becomes empty; the host resends on
                // its next rotation.
                blob: BASE64.decode(blob.as_bytes()).unwrap_or_default(),
            },
            BridgeEvent::AuthFailure { reason } => MessengerEvent::AuthFailure(reason),
            BridgeEvent::Disconnected { reason } => MessengerEvent::Disconnected { reason },
            BridgeEvent::Message {
                id,
                chat_id,
                from,
                to,
                body,
                mime_type,
                media_data,
                filename,
                quoted_id,
                sender_name,
                formatted_phone,
                raw_phone,
                timestamp,
            } => {
                let content = match (mime_type, media_data) {
                    (Some(mime_type), Some(data)) => MessageContent::Media {
                        mime_type,
                        data,
                        filename,
                        caption: if body.is_empty() { None } else { Some(body) },
                    },
                    _ => MessageContent::Text { body },
                };
                MessengerEvent::Message(IncomingMessage {
                    id,
                    chat_id: ChatId(chat_id),
                    from,
                    to,
                    content,
                    quoted_id,
                    sender_name,
                    formatted_phone,
                    raw_phone,
                    timestamp: timestamp.unwrap_or_else(Utc::now),
                })
            }
            BridgeEvent::MessageAck { message_id, ack } => MessengerEvent::MessageAck {
                message_id,
                raw_code: ack,
            },
            BridgeEvent::Reaction {
                message_id,
                sender,
                text,
            } => MessengerEvent::Reaction {
                message_id,
                sender,
                text,
            },
        }
    }
}
