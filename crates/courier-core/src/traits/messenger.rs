// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability trait for the external messaging client.
//!
//! This is the single most important seam in the workspace: the lifecycle
//! controller, dispatcher, and broadcaster are all written against it, and
//! tests swap in a deterministic fake. The real implementation wraps whatever
//! client library speaks the network's wire protocol; Courier never does.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CourierError;
use crate::types::{ChatId, MessageContent, MessengerEvent, SendOptions, TenantId};

/// Capacity of the per-tenant event queue handed out by [`MessengerFactory`].
///
/// Bounded so a stalled consumer applies backpressure to the client instead
/// of growing without limit.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// A chat object fetched from the live session.
///
/// Sending through the fetched chat is the alternate delivery path used when
/// the direct send is rejected for reasons unrelated to recipient validity.
#[async_trait]
pub trait RemoteChat: Send + Sync {
    fn id(&self) -> &ChatId;

    /// Sends through this chat object, returning the network-assigned message id.
    async fn send(
        &self,
        content: &MessageContent,
        opts: &SendOptions,
    ) -> Result<String, CourierError>;
}

/// One tenant's live connection to the messaging network.
#[async_trait]
pub trait MessengerClient: Send + Sync {
    /// Starts the client (network/browser startup). Suspends until the client
    /// is running; pairing and readiness arrive later as events.
    async fn initialize(&self) -> Result<(), CourierError>;

    /// Tears the client down. Implementations must tolerate repeated calls.
    async fn destroy(&self) -> Result<(), CourierError>;

    /// Direct send, returning the network-assigned message id.
    async fn send_message(
        &self,
        chat: &ChatId,
        content: &MessageContent,
        opts: &SendOptions,
    ) -> Result<String, CourierError>;

    /// Fetches the chat object for the alternate send path.
    async fn get_chat_by_id(&self, chat: &ChatId)
        -> Result<Box<dyn RemoteChat>, CourierError>;

    /// Asks the network to canonicalize a bare digit string.
    ///
    /// `Ok(None)` means the network does not know the number; callers fall
    /// back to constructing a default person identifier.
    async fn validate_number(&self, digits: &str) -> Result<Option<ChatId>, CourierError>;
}

/// Creates per-tenant messaging clients together with their event stream.
///
/// The receiver is the only way events leave the client: one bounded queue
/// per tenant, drained in order by the event router.
#[async_trait]
pub trait MessengerFactory: Send + Sync {
    async fn create(
        &self,
        tenant: &TenantId,
    ) -> Result<(Arc<dyn MessengerClient>, mpsc::Receiver<MessengerEvent>), CourierError>;
}
