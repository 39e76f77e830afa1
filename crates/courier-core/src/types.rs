// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Courier workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for an isolated customer organization.
///
/// All session state, caches, and locks are partitioned by tenant id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A protocol-addressable chat identifier (person or group conversation).
///
/// Distinct from a raw phone number: a `ChatId` always carries the network's
/// addressing suffix. Raw input is turned into a `ChatId` by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// States in the per-tenant session FSM.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session; nothing in flight.
    Idle,
    /// Client created, initialize in progress.
    Initializing,
    /// Pairing window open, QR payload available for scanning.
    WaitingQr,
    /// Authenticated and connected; sends are allowed.
    Ready,
    /// Terminal failure requiring manual intervention.
    Error,
    /// Connection lost; credentials retained for silent resume.
    Disconnected,
}

impl SessionStatus {
    /// Statuses at which the per-tenant connect lock is released.
    pub fn is_stable(self) -> bool {
        matches!(
            self,
            SessionStatus::Idle
                | SessionStatus::Ready
                | SessionStatus::Error
                | SessionStatus::Disconnected
        )
    }
}

/// Point-in-time view of a tenant's session state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    /// Present only while `status == WaitingQr`.
    pub qr_payload: Option<String>,
    pub last_error: Option<String>,
    /// Bounded QR retry counter; reset to zero on successful pairing.
    pub attempt_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            qr_payload: None,
            last_error: None,
            attempt_count: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Direction of a stored message relative to the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

/// Delivery acknowledgement status for an outbound or inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Played,
    Failed,
}

impl AckStatus {
    /// Maps the network's raw ack code to a status.
    ///
    /// Unknown codes map to `Pending` rather than failing the event.
    pub fn from_raw(code: i32) -> Self {
        match code {
            -1 => AckStatus::Failed,
            1 => AckStatus::Sent,
            2 => AckStatus::Delivered,
            3 => AckStatus::Read,
            4 => AckStatus::Played,
            _ => AckStatus::Pending,
        }
    }
}

/// Message content as a tagged union with an explicit unspecified case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        body: String,
    },
    Media {
        mime_type: String,
        /// Base64 payload or an opaque reference the client understands.
        data: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Location {
        latitude: f64,
        longitude: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    ContactCard {
        name: String,
        phone: String,
    },
    Buttons {
        body: String,
        buttons: Vec<String>,
    },
    List {
        body: String,
        button_text: String,
        sections: Vec<ListSection>,
    },
    Unspecified,
}

impl MessageContent {
    pub fn text(body: impl Into<String>) -> Self {
        MessageContent::Text { body: body.into() }
    }

    /// Human-readable body for persistence and webhook payloads.
    pub fn body_text(&self) -> String {
        match self {
            MessageContent::Text { body } => body.clone(),
            MessageContent::Media { caption, .. } => caption.clone().unwrap_or_default(),
            MessageContent::Location { description, .. } => {
                description.clone().unwrap_or_default()
            }
            MessageContent::ContactCard { name, .. } => name.clone(),
            MessageContent::Buttons { body, .. } | MessageContent::List { body, .. } => {
                body.clone()
            }
            MessageContent::Unspecified => String::new(),
        }
    }
}

/// One section of a list-menu message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

/// One selectable row of a list-menu section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A reaction on a message, keyed by sender.
///
/// An empty `text` means the sender removed their reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub sender: String,
    pub text: String,
}

/// Durable record of a message, keyed by the network's own message id.
///
/// Created on receipt, updated in place for ack/reaction events, never
/// deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Externally-assigned message id; natural key for upserts.
    pub external_id: String,
    pub tenant_id: TenantId,
    pub direction: MessageDirection,
    pub chat_id: ChatId,
    pub from: String,
    pub to: String,
    pub body: String,
    pub content: MessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_id: Option<String>,
    pub ack: AckStatus,
    pub reactions: Vec<Reaction>,
    pub timestamp: DateTime<Utc>,
}

/// Options for a send operation.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// External id of the message this send replies to.
    pub quoted_message_id: Option<String>,
}

/// Raw inbound message as delivered by the messaging client.
///
/// The router turns this into a [`MessageRecord`]. The three phone fields
/// mirror the network's own identity hints, in decreasing reliability;
/// the router applies the reconciliation fallback chain over them.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: String,
    pub chat_id: ChatId,
    pub from: String,
    pub to: String,
    pub content: MessageContent,
    pub quoted_id: Option<String>,
    pub sender_name: Option<String>,
    pub formatted_phone: Option<String>,
    pub raw_phone: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Events emitted by the messaging client for one tenant session.
#[derive(Debug, Clone)]
pub enum MessengerEvent {
    /// A pairing QR payload is available for scanning.
    Qr(String),
    /// The session is authenticated and connected.
    Ready,
    /// Opaque credential material to persist for silent resume.
    ///
    /// Emitted after a successful pairing and whenever the client rotates
    /// its stored session material.
    Credentials { blob: Vec<u8> },
    /// The network rejected the stored credentials.
    AuthFailure(String),
    /// The connection dropped; `reason` is the network's own description.
    Disconnected { reason: String },
    /// An inbound message arrived.
    Message(IncomingMessage),
    /// Delivery receipt for a known message.
    MessageAck { message_id: String, raw_code: i32 },
    /// Reaction added or removed on a known message.
    Reaction {
        message_id: String,
        sender: String,
        text: String,
    },
}

/// Signed JSON notification delivered to a tenant-configured endpoint.
///
/// Immutable once constructed; serialized once and signed over the exact
/// serialized bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub event: String,
    pub tenant_id: String,
    pub from: String,
    pub to: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub message_id: String,
}

/// Terminal and in-flight states of a campaign run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Processing,
    Completed,
    Failed,
}

/// Recipient filter for a campaign run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum CampaignFilter {
    All,
    Active,
    Segment { name: String },
}

/// Final accounting of a campaign run.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignOutcome {
    pub status: CampaignStatus,
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-recipient delivery log status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// A customer record, one of the two campaign audience sources.
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub phone: String,
    pub name: String,
    pub active: bool,
    pub segment: Option<String>,
}

/// A standalone contact record, the other campaign audience source.
#[derive(Debug, Clone)]
pub struct ContactRecord {
    pub phone: String,
    pub name: String,
    pub segment: Option<String>,
}

/// A conversation between the tenant and one customer.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub tenant_id: TenantId,
    /// Canonical customer phone as currently stored; may be healed later.
    pub customer_phone: String,
    pub assignee: Option<String>,
}

/// A tenant team member, listed in stable creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
}

/// Tenant-scoped settings this subsystem reads and writes.
#[derive(Debug, Clone, Default)]
pub struct TenantSettings {
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub auto_assign: bool,
    pub last_assigned_index: i64,
}

/// Real-time notification published on a tenant-scoped channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TenantEvent {
    State {
        status: SessionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        qr: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
    Message(MessageRecord),
    MessageAck {
        message_id: String,
        status: AckStatus,
        raw: i32,
    },
    Reaction {
        message_id: String,
        reactions: Vec<Reaction>,
    },
    Assigned {
        conversation_id: String,
        assignee: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn session_status_display() {
        assert_eq!(SessionStatus::Idle.to_string(), "idle");
        assert_eq!(SessionStatus::WaitingQr.to_string(), "waiting_qr");
        assert_eq!(SessionStatus::Disconnected.to_string(), "disconnected");
    }

    #[test]
    fn session_status_round_trips() {
        for status in [
            SessionStatus::Idle,
            SessionStatus::Initializing,
            SessionStatus::WaitingQr,
            SessionStatus::Ready,
            SessionStatus::Error,
            SessionStatus::Disconnected,
        ] {
            let parsed = SessionStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn stable_statuses_release_the_lock() {
        assert!(SessionStatus::Idle.is_stable());
        assert!(SessionStatus::Ready.is_stable());
        assert!(SessionStatus::Error.is_stable());
        assert!(SessionStatus::Disconnected.is_stable());
        assert!(!SessionStatus::Initializing.is_stable());
        assert!(!SessionStatus::WaitingQr.is_stable());
    }

    #[test]
    fn ack_status_from_raw_codes() {
        assert_eq!(AckStatus::from_raw(-1), AckStatus::Failed);
        assert_eq!(AckStatus::from_raw(0), AckStatus::Pending);
        assert_eq!(AckStatus::from_raw(1), AckStatus::Sent);
        assert_eq!(AckStatus::from_raw(2), AckStatus::Delivered);
        assert_eq!(AckStatus::from_raw(3), AckStatus::Read);
        assert_eq!(AckStatus::from_raw(4), AckStatus::Played);
        assert_eq!(AckStatus::from_raw(99), AckStatus::Pending);
    }

    #[test]
    fn webhook_payload_uses_camel_case_keys() {
        let payload = WebhookPayload {
            event: "message".into(),
            tenant_id: "acme".into(),
            from: "201001234567@c.us".into(),
            to: "201009999999@c.us".into(),
            body: "hello".into(),
            timestamp: Utc::now(),
            message_id: "msg-1".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("tenantId").is_some());
        assert!(json.get("messageId").is_some());
        assert!(json.get("tenant_id").is_none());
    }

    #[test]
    fn tenant_event_tags_with_event_name() {
        let event = TenantEvent::Assigned {
            conversation_id: "conv-1".into(),
            assignee: "member-2".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "assigned");
    }

    #[test]
    fn content_body_text_per_variant() {
        assert_eq!(MessageContent::text("hi").body_text(), "hi");
        let media = MessageContent::Media {
            mime_type: "image/png".into(),
            data: "AAAA".into(),
            filename: None,
            caption: Some("a chart".into()),
        };
        assert_eq!(media.body_text(), "a chart");
        assert_eq!(MessageContent::Unspecified.body_text(), "");
    }

    #[test]
    fn empty_reaction_text_means_removed() {
        let reaction = Reaction {
            sender: "2010@c.us".into(),
            text: String::new(),
        };
        assert!(reaction.text.is_empty());
    }
}
