// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data-store collaborator trait.
//!
//! The relational store is the system of record for durable entities. All
//! writes are keyed by natural/business keys (message id, tenant+campaign+
//! phone) so concurrent upserts are safe without distributed locks.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{
    AckStatus, CampaignStatus, ContactRecord, Conversation, CustomerRecord, DeliveryStatus,
    MessageRecord, Reaction, TeamMember, TenantId, TenantSettings,
};

#[async_trait]
pub trait DataStore: Send + Sync {
    // --- Messages ---

    /// Inserts or updates a message by its external id. Repeated delivery of
    /// the same event never creates a duplicate row.
    async fn upsert_message(&self, record: &MessageRecord) -> Result<(), CourierError>;

    /// Updates the ack status of an existing message in place.
    async fn update_message_ack(
        &self,
        tenant: &TenantId,
        message_id: &str,
        ack: AckStatus,
    ) -> Result<(), CourierError>;

    /// Applies a reaction keyed by sender (empty text removes it) and returns
    /// the message's current reaction list.
    async fn apply_message_reaction(
        &self,
        tenant: &TenantId,
        message_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<Vec<Reaction>, CourierError>;

    // --- Conversations ---

    /// Returns the conversation for a customer phone, creating it if absent.
    async fn resolve_conversation(
        &self,
        tenant: &TenantId,
        phone: &str,
        display_name: Option<&str>,
    ) -> Result<Conversation, CourierError>;

    /// Replaces a conversation's stored customer phone with a better one.
    async fn update_conversation_phone(
        &self,
        tenant: &TenantId,
        conversation_id: &str,
        phone: &str,
    ) -> Result<(), CourierError>;

    /// Assigns a conversation to a team member.
    async fn assign_conversation(
        &self,
        tenant: &TenantId,
        conversation_id: &str,
        member_id: &str,
    ) -> Result<(), CourierError>;

    // --- Campaign audience and delivery log ---

    async fn list_customers(&self, tenant: &TenantId)
        -> Result<Vec<CustomerRecord>, CourierError>;

    async fn list_contacts(&self, tenant: &TenantId)
        -> Result<Vec<ContactRecord>, CourierError>;

    /// Normalized phones already logged `sent` for this campaign.
    async fn sent_phones(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
    ) -> Result<Vec<String>, CourierError>;

    /// Appends one delivery-log entry, keyed (campaign, phone).
    async fn append_delivery(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        phone: &str,
        status: DeliveryStatus,
        error: Option<&str>,
    ) -> Result<(), CourierError>;

    /// Persists running campaign status and counters for live progress.
    async fn update_campaign_progress(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        status: CampaignStatus,
        sent: usize,
        failed: usize,
        message: Option<&str>,
    ) -> Result<(), CourierError>;

    // --- Tenant settings and team ---

    async fn tenant_settings(&self, tenant: &TenantId)
        -> Result<TenantSettings, CourierError>;

    async fn set_last_assigned_index(
        &self,
        tenant: &TenantId,
        index: i64,
    ) -> Result<(), CourierError>;

    /// Team members in stable creation order.
    async fn team_members(&self, tenant: &TenantId) -> Result<Vec<TeamMember>, CourierError>;
}
