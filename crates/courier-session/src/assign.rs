// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin auto-assignment of new conversations.

use std::sync::Arc;

use tracing::{debug, info};

use courier_core::types::{Conversation, TenantEvent, TenantId};
use courier_core::{CourierError, DataStore, RealtimePublisher};

/// Distributes newly-arrived conversations across a tenant's team members
/// in stable creation order.
///
/// Assignment is monotonic and idempotent per conversation: an already
/// assigned conversation, a disabled tenant, or an empty team is a no-op.
pub struct AutoAssignCoordinator {
    store: Arc<dyn DataStore>,
    publisher: Arc<dyn RealtimePublisher>,
}

impl AutoAssignCoordinator {
    pub fn new(store: Arc<dyn DataStore>, publisher: Arc<dyn RealtimePublisher>) -> Self {
        Self { store, publisher }
    }

    /// Assign `conversation` to the next team member, if applicable.
    pub async fn maybe_assign(
        &self,
        tenant: &TenantId,
        conversation: &Conversation,
    ) -> Result<(), CourierError> {
        if conversation.assignee.is_some() {
            return Ok(());
        }

        let settings = self.store.tenant_settings(tenant).await?;
        if !settings.auto_assign {
            return Ok(());
        }

        let team = self.store.team_members(tenant).await?;
        if team.is_empty() {
            debug!(tenant = %tenant, "auto-assign enabled but team is empty");
            return Ok(());
        }

        let next = next_index(settings.last_assigned_index, team.len());
        let member = &team[next];

        self.store
            .assign_conversation(tenant, &conversation.id, &member.id)
            .await?;
        self.store
            .set_last_assigned_index(tenant, next as i64)
            .await?;

        self.publisher.publish(
            tenant,
            TenantEvent::Assigned {
                conversation_id: conversation.id.clone(),
                assignee: member.id.clone(),
            },
        );

        info!(
            tenant = %tenant,
            conversation = %conversation.id,
            member = %member.id,
            "conversation auto-assigned"
        );
        Ok(())
    }
}

/// `(last + 1) mod team_size`, tolerating the -1 "never assigned" sentinel
/// and stale indexes from a larger former team.
fn next_index(last_assigned: i64, team_size: usize) -> usize {
    let next = last_assigned.saturating_add(1).max(0) as usize;
    next % team_size
}
