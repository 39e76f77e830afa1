// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign delivery log and run progress operations.
//!
//! The delivery log is keyed `(tenant, campaign, phone)`; the `sent` lookup
//! drives idempotent resume. Progress counters are written after every
//! attempt so a crash mid-run loses at most one in-flight recipient.

use courier_core::types::{CampaignStatus, DeliveryStatus, TenantId};
use courier_core::CourierError;
use rusqlite::params;

use crate::database::Database;

/// Normalized phones already logged `sent` for this campaign.
pub async fn sent_phones(
    db: &Database,
    tenant: &TenantId,
    campaign_id: &str,
) -> Result<Vec<String>, CourierError> {
    let tenant = tenant.clone();
    let campaign_id = campaign_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT phone FROM campaign_deliveries
                 WHERE tenant_id = ?1 AND campaign_id = ?2 AND status = 'sent'",
            )?;
            let rows = stmt.query_map(params![tenant.as_str(), campaign_id], |row| {
                row.get::<_, String>(0)
            })?;
            let mut phones = Vec::new();
            for row in rows {
                phones.push(row?);
            }
            Ok(phones)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record one delivery attempt. A later `sent` for the same phone replaces
/// an earlier `failed` (resume path); a `sent` entry is never downgraded.
pub async fn append_delivery(
    db: &Database,
    tenant: &TenantId,
    campaign_id: &str,
    phone: &str,
    status: DeliveryStatus,
    error: Option<&str>,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let campaign_id = campaign_id.to_string();
    let phone = phone.to_string();
    let error = error.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO campaign_deliveries
                   (tenant_id, campaign_id, phone, status, error, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (tenant_id, campaign_id, phone) DO UPDATE SET
                   status = excluded.status,
                   error = excluded.error,
                   created_at = excluded.created_at
                 WHERE campaign_deliveries.status != 'sent'",
                params![
                    tenant.as_str(),
                    campaign_id,
                    phone,
                    status.to_string(),
                    error,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist running campaign status and counters for live progress reporting.
pub async fn update_progress(
    db: &Database,
    tenant: &TenantId,
    campaign_id: &str,
    status: CampaignStatus,
    sent: usize,
    failed: usize,
    message: Option<&str>,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let campaign_id = campaign_id.to_string();
    let message = message.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO campaign_runs
                   (tenant_id, campaign_id, status, sent, failed, message, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (tenant_id, campaign_id) DO UPDATE SET
                   status = excluded.status,
                   sent = excluded.sent,
                   failed = excluded.failed,
                   message = excluded.message,
                   updated_at = excluded.updated_at",
                params![
                    tenant.as_str(),
                    campaign_id,
                    status.to_string(),
                    sent as i64,
                    failed as i64,
                    message,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
