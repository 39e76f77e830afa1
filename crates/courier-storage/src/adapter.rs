// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the DataStore trait.

use async_trait::async_trait;

use courier_core::types::{
    AckStatus, CampaignStatus, ContactRecord, Conversation, CustomerRecord, DeliveryStatus,
    MessageRecord, Reaction, TeamMember, TenantId, TenantSettings,
};
use courier_core::{CourierError, DataStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed data store.
///
/// Wraps a [`Database`] handle and delegates all operations to the typed
/// query modules. Cheap to clone.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub async fn open(path: &str) -> Result<Self, CourierError> {
        Ok(Self {
            db: Database::open(path).await?,
        })
    }

    /// Wrap an already-open database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle, for seeding and maintenance.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checkpoint and close.
    pub async fn close(&self) -> Result<(), CourierError> {
        self.db.close().await
    }

    // --- Seeding helpers (platform surface and tests) ---

    pub async fn set_tenant_settings(
        &self,
        tenant: &TenantId,
        settings: &TenantSettings,
    ) -> Result<(), CourierError> {
        queries::tenants::set_tenant_settings(&self.db, tenant, settings).await
    }

    pub async fn add_team_member(
        &self,
        tenant: &TenantId,
        member: &TeamMember,
    ) -> Result<(), CourierError> {
        queries::tenants::add_team_member(&self.db, tenant, member).await
    }

    pub async fn upsert_customer(
        &self,
        tenant: &TenantId,
        customer: &CustomerRecord,
    ) -> Result<(), CourierError> {
        queries::tenants::upsert_customer(&self.db, tenant, customer).await
    }

    pub async fn upsert_contact(
        &self,
        tenant: &TenantId,
        contact: &ContactRecord,
    ) -> Result<(), CourierError> {
        queries::tenants::upsert_contact(&self.db, tenant, contact).await
    }

    pub async fn get_message(
        &self,
        tenant: &TenantId,
        message_id: &str,
    ) -> Result<Option<MessageRecord>, CourierError> {
        queries::messages::get_message(&self.db, tenant, message_id).await
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn upsert_message(&self, record: &MessageRecord) -> Result<(), CourierError> {
        queries::messages::upsert_message(&self.db, record).await
    }

    async fn update_message_ack(
        &self,
        tenant: &TenantId,
        message_id: &str,
        ack: AckStatus,
    ) -> Result<(), CourierError> {
        queries::messages::update_ack(&self.db, tenant, message_id, ack).await
    }

    async fn apply_message_reaction(
        &self,
        tenant: &TenantId,
        message_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<Vec<Reaction>, CourierError> {
        queries::messages::apply_reaction(&self.db, tenant, message_id, sender, text).await
    }

    async fn resolve_conversation(
        &self,
        tenant: &TenantId,
        phone: &str,
        display_name: Option<&str>,
    ) -> Result<Conversation, CourierError> {
        queries::tenants::resolve_conversation(&self.db, tenant, phone, display_name).await
    }

    async fn update_conversation_phone(
        &self,
        tenant: &TenantId,
        conversation_id: &str,
        phone: &str,
    ) -> Result<(), CourierError> {
        queries::tenants::update_conversation_phone(&self.db, tenant, conversation_id, phone)
            .await
    }

    async fn assign_conversation(
        &self,
        tenant: &TenantId,
        conversation_id: &str,
        member_id: &str,
    ) -> Result<(), CourierError> {
        queries::tenants::assign_conversation(&self.db, tenant, conversation_id, member_id)
            .await
    }

    async fn list_customers(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<CustomerRecord>, CourierError> {
        queries::tenants::list_customers(&self.db, tenant).await
    }

    async fn list_contacts(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<ContactRecord>, CourierError> {
        queries::tenants::list_contacts(&self.db, tenant).await
    }

    async fn sent_phones(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
    ) -> Result<Vec<String>, CourierError> {
        queries::campaigns::sent_phones(&self.db, tenant, campaign_id).await
    }

    async fn append_delivery(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        phone: &str,
        status: DeliveryStatus,
        error: Option<&str>,
    ) -> Result<(), CourierError> {
        queries::campaigns::append_delivery(&self.db, tenant, campaign_id, phone, status, error)
            .await
    }

    async fn update_campaign_progress(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        status: CampaignStatus,
        sent: usize,
        failed: usize,
        message: Option<&str>,
    ) -> Result<(), CourierError> {
        queries::campaigns::update_progress(
            &self.db, tenant, campaign_id, status, sent, failed, message,
        )
        .await
    }

    async fn tenant_settings(&self, tenant: &TenantId) -> Result<TenantSettings, CourierError> {
        queries::tenants::tenant_settings(&self.db, tenant).await
    }

    async fn set_last_assigned_index(
        &self,
        tenant: &TenantId,
        index: i64,
    ) -> Result<(), CourierError> {
        queries::tenants::set_last_assigned_index(&self.db, tenant, index).await
    }

    async fn team_members(&self, tenant: &TenantId) -> Result<Vec<TeamMember>, CourierError> {
        queries::tenants::team_members(&self.db, tenant).await
    }
}
