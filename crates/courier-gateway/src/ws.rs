// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant-scoped realtime channel over WebSocket.
//!
//! Server -> Client (JSON, tagged by `event`):
//! ```json
//! {"event": "state", "status": "ready", "timestamp": "..."}
//! {"event": "message", ...}
//! {"event": "message_ack", "message_id": "...", "status": "read", "raw": 3}
//! {"event": "reaction", "message_id": "...", "reactions": [...]}
//! {"event": "assigned", "conversation_id": "...", "assignee": "..."}
//! ```
//!
//! Clients subscribe with `GET /ws?tenant=<id>`; the socket is read-only
//! apart from close frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use courier_core::types::{TenantEvent, TenantId};
use courier_core::RealtimePublisher;

use crate::server::GatewayState;

/// Buffered events per tenant channel; slow subscribers skip, not block.
const CHANNEL_CAPACITY: usize = 256;

/// Publishes tenant events to WebSocket subscribers via per-tenant
/// broadcast channels. Publishing with no subscribers drops the event.
#[derive(Default)]
pub struct WsPublisher {
    channels: DashMap<String, broadcast::Sender<String>>,
}

impl WsPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a tenant's event stream, creating the channel lazily.
    pub fn subscribe(&self, tenant: &TenantId) -> broadcast::Receiver<String> {
        self.channels
            .entry(tenant.as_str().to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Live subscriber count for a tenant.
    pub fn subscriber_count(&self, tenant: &TenantId) -> usize {
        self.channels
            .get(tenant.as_str())
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl RealtimePublisher for WsPublisher {
    fn publish(&self, tenant: &TenantId, event: TenantEvent) {
        let Some(sender) = self.channels.get(tenant.as_str()) else {
            return;
        };
        match serde_json::to_string(&event) {
            Ok(encoded) => {
                // Send errors just mean no live subscribers.
                let _ = sender.send(encoded);
            }
            Err(e) => warn!(tenant = %tenant, error = %e, "event serialization failed"),
        }
    }
}

/// Query parameters for the WebSocket subscription.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub tenant: String,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<GatewayState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.tenant))
}

async fn handle_socket(socket: WebSocket, state: GatewayState, tenant: String) {
    let tenant = TenantId::new(tenant);
    let mut events = state.realtime.subscribe(&tenant);
    debug!(tenant = %tenant, "realtime subscriber connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(encoded) => {
                        if ws_sender.send(Message::Text(encoded.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(tenant = %tenant, skipped, "slow realtime subscriber skipped events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // The channel is one-way; ignore client payloads.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!(tenant = %tenant, "realtime subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::types::SessionStatus;

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let publisher = WsPublisher::new();
        let tenant = TenantId::from("acme");
        // No channel exists yet; publishing must not panic or create one.
        publisher.publish(
            &tenant,
            TenantEvent::State {
                status: SessionStatus::Idle,
                qr: None,
                error: None,
                timestamp: chrono::Utc::now(),
            },
        );
        assert_eq!(publisher.subscriber_count(&tenant), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_serialized_events() {
        let publisher = WsPublisher::new();
        let tenant = TenantId::from("acme");
        let mut rx = publisher.subscribe(&tenant);

        publisher.publish(
            &tenant,
            TenantEvent::Assigned {
                conversation_id: "conv-1".into(),
                assignee: "tm-2".into(),
            },
        );

        let encoded = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["event"], "assigned");
        assert_eq!(value["assignee"], "tm-2");
    }

    #[tokio::test]
    async fn channels_are_tenant_scoped() {
        let publisher = WsPublisher::new();
        let acme = TenantId::from("acme");
        let globex = TenantId::from("globex");
        let mut acme_rx = publisher.subscribe(&acme);
        let _globex_rx = publisher.subscribe(&globex);

        publisher.publish(
            &globex,
            TenantEvent::Assigned {
                conversation_id: "conv-1".into(),
                assignee: "tm-1".into(),
            },
        );

        // The acme subscriber sees nothing.
        assert!(acme_rx.try_recv().is_err());
    }
}
