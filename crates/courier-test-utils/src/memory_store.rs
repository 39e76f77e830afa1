// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory DataStore implementation.
//!
//! Mirrors the SQLite store's semantics (natural-key upserts, sent entries
//! never downgraded, settings defaulting) so session and campaign tests run
//! without a database file.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::types::{
    AckStatus, CampaignStatus, ContactRecord, Conversation, CustomerRecord, DeliveryStatus,
    MessageRecord, Reaction, TeamMember, TenantId, TenantSettings,
};
use courier_core::{CourierError, DataStore};

/// One recorded campaign run row.
#[derive(Debug, Clone)]
pub struct CampaignRunRow {
    pub status: CampaignStatus,
    pub sent: usize,
    pub failed: usize,
    pub message: Option<String>,
}

#[derive(Default)]
struct Inner {
    messages: HashMap<(String, String), MessageRecord>,
    conversations: HashMap<String, Conversation>,
    deliveries: HashMap<(String, String, String), (DeliveryStatus, Option<String>)>,
    runs: HashMap<(String, String), CampaignRunRow>,
    settings: HashMap<String, TenantSettings>,
    team: HashMap<String, Vec<TeamMember>>,
    customers: HashMap<String, Vec<CustomerRecord>>,
    contacts: HashMap<String, Vec<ContactRecord>>,
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryDataStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Seeding and inspection helpers ---

    pub async fn set_tenant_settings(&self, tenant: &TenantId, settings: TenantSettings) {
        self.inner
            .lock()
            .await
            .settings
            .insert(tenant.as_str().to_string(), settings);
    }

    pub async fn add_team_member(&self, tenant: &TenantId, member: TeamMember) {
        self.inner
            .lock()
            .await
            .team
            .entry(tenant.as_str().to_string())
            .or_default()
            .push(member);
    }

    pub async fn add_customer(&self, tenant: &TenantId, customer: CustomerRecord) {
        self.inner
            .lock()
            .await
            .customers
            .entry(tenant.as_str().to_string())
            .or_default()
            .push(customer);
    }

    pub async fn add_contact(&self, tenant: &TenantId, contact: ContactRecord) {
        self.inner
            .lock()
            .await
            .contacts
            .entry(tenant.as_str().to_string())
            .or_default()
            .push(contact);
    }

    pub async fn message(&self, tenant: &TenantId, id: &str) -> Option<MessageRecord> {
        self.inner
            .lock()
            .await
            .messages
            .get(&(tenant.as_str().to_string(), id.to_string()))
            .cloned()
    }

    pub async fn message_count(&self) -> usize {
        self.inner.lock().await.messages.len()
    }

    pub async fn delivery(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        phone: &str,
    ) -> Option<(DeliveryStatus, Option<String>)> {
        self.inner
            .lock()
            .await
            .deliveries
            .get(&(
                tenant.as_str().to_string(),
                campaign_id.to_string(),
                phone.to_string(),
            ))
            .cloned()
    }

    pub async fn campaign_run(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
    ) -> Option<CampaignRunRow> {
        self.inner
            .lock()
            .await
            .runs
            .get(&(tenant.as_str().to_string(), campaign_id.to_string()))
            .cloned()
    }

    pub async fn conversations(&self, tenant: &TenantId) -> Vec<Conversation> {
        self.inner
            .lock()
            .await
            .conversations
            .values()
            .filter(|c| c.tenant_id == *tenant)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn upsert_message(&self, record: &MessageRecord) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        let key = (
            record.tenant_id.as_str().to_string(),
            record.external_id.clone(),
        );
        match inner.messages.get_mut(&key) {
            Some(existing) => {
                // Redelivery updates content but never clobbers ack/reactions.
                existing.body = record.body.clone();
                existing.content = record.content.clone();
                existing.chat_id = record.chat_id.clone();
                existing.from = record.from.clone();
                existing.to = record.to.clone();
                existing.quoted_id = record.quoted_id.clone();
                existing.timestamp = record.timestamp;
            }
            None => {
                inner.messages.insert(key, record.clone());
            }
        }
        Ok(())
    }

    async fn update_message_ack(
        &self,
        tenant: &TenantId,
        message_id: &str,
        ack: AckStatus,
    ) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        if let Some(record) = inner
            .messages
            .get_mut(&(tenant.as_str().to_string(), message_id.to_string()))
        {
            record.ack = ack;
        }
        Ok(())
    }

    async fn apply_message_reaction(
        &self,
        tenant: &TenantId,
        message_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<Vec<Reaction>, CourierError> {
        let mut inner = self.inner.lock().await;
        let Some(record) = inner
            .messages
            .get_mut(&(tenant.as_str().to_string(), message_id.to_string()))
        else {
            return Ok(Vec::new());
        };
        record.reactions.retain(|r| r.sender != sender);
        if !text.is_empty() {
            record.reactions.push(Reaction {
                sender: sender.to_string(),
                text: text.to_string(),
            });
        }
        Ok(record.reactions.clone())
    }

    async fn resolve_conversation(
        &self,
        tenant: &TenantId,
        phone: &str,
        _display_name: Option<&str>,
    ) -> Result<Conversation, CourierError> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .conversations
            .values()
            .find(|c| c.tenant_id == *tenant && c.customer_phone == phone)
        {
            return Ok(existing.clone());
        }
        let conversation = Conversation {
            id: format!("conv-{}-{}", tenant.as_str(), phone),
            tenant_id: tenant.clone(),
            customer_phone: phone.to_string(),
            assignee: None,
        };
        inner
            .conversations
            .insert(conversation.id.clone(), conversation.clone());
        Ok(conversation)
    }

    async fn update_conversation_phone(
        &self,
        tenant: &TenantId,
        conversation_id: &str,
        phone: &str,
    ) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        if let Some(conversation) = inner.conversations.get_mut(conversation_id) {
            if conversation.tenant_id == *tenant {
                conversation.customer_phone = phone.to_string();
            }
        }
        Ok(())
    }

    async fn assign_conversation(
        &self,
        tenant: &TenantId,
        conversation_id: &str,
        member_id: &str,
    ) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        if let Some(conversation) = inner.conversations.get_mut(conversation_id) {
            if conversation.tenant_id == *tenant {
                conversation.assignee = Some(member_id.to_string());
            }
        }
        Ok(())
    }

    async fn list_customers(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<CustomerRecord>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .customers
            .get(tenant.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn list_contacts(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<ContactRecord>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .contacts
            .get(tenant.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn sent_phones(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
    ) -> Result<Vec<String>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .deliveries
            .iter()
            .filter(|((t, c, _), (status, _))| {
                t == tenant.as_str() && c == campaign_id && *status == DeliveryStatus::Sent
            })
            .map(|((_, _, phone), _)| phone.clone())
            .collect())
    }

    async fn append_delivery(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        phone: &str,
        status: DeliveryStatus,
        error: Option<&str>,
    ) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        let key = (
            tenant.as_str().to_string(),
            campaign_id.to_string(),
            phone.to_string(),
        );
        // A sent entry is never downgraded.
        if let Some((DeliveryStatus::Sent, _)) = inner.deliveries.get(&key) {
            return Ok(());
        }
        inner
            .deliveries
            .insert(key, (status, error.map(str::to_string)));
        Ok(())
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
        self.inner.lock().await.runs.insert(
            (tenant.as_str().to_string(), campaign_id.to_string()),
            CampaignRunRow {
                status,
                sent,
                failed,
                message: message.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn tenant_settings(&self, tenant: &TenantId) -> Result<TenantSettings, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .settings
            .get(tenant.as_str())
            .cloned()
            .unwrap_or(TenantSettings {
                last_assigned_index: -1,
                ..TenantSettings::default()
            }))
    }

    async fn set_last_assigned_index(
        &self,
        tenant: &TenantId,
        index: i64,
    ) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        let settings = inner
            .settings
            .entry(tenant.as_str().to_string())
            .or_insert_with(|| TenantSettings {
                last_assigned_index: -1,
                ..TenantSettings::default()
            });
        settings.last_assigned_index = index;
        Ok(())
    }

    async fn team_members(&self, tenant: &TenantId) -> Result<Vec<TeamMember>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .team
            .get(tenant.as_str())
            .cloned()
            .unwrap_or_default())
    }
}
