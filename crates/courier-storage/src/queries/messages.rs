// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message upsert and in-place update operations.
//!
//! Messages are keyed by the network's own message id, so repeated delivery
//! of the same event updates rather than duplicates.

use std::str::FromStr;

use courier_core::types::{
    AckStatus, ChatId, MessageContent, MessageDirection, MessageRecord, Reaction, TenantId,
};
use courier_core::CourierError;
use rusqlite::params;

use crate::database::Database;

/// Insert or update a message by `(tenant_id, external_id)`.
pub async fn upsert_message(db: &Database, record: &MessageRecord) -> Result<(), CourierError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            let content = serde_json::to_string(&record.content)
                .unwrap_or_else(|_| "{\"kind\":\"unspecified\"}".to_string());
            let reactions = serde_json::to_string(&record.reactions)
                .unwrap_or_else(|_| "[]".to_string());
            conn.execute(
                "INSERT INTO messages
                   (tenant_id, external_id, direction, chat_id, sender, recipient,
                    body, content, quoted_id, ack, reactions, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT (tenant_id, external_id) DO UPDATE SET
                   direction = excluded.direction,
                   chat_id = excluded.chat_id,
                   sender = excluded.sender,
                   recipient = excluded.recipient,
                   body = excluded.body,
                   content = excluded.content,
                   quoted_id = excluded.quoted_id,
                   timestamp = excluded.timestamp",
                params![
                    record.tenant_id.as_str(),
                    record.external_id,
                    record.direction.to_string(),
                    record.chat_id.as_str(),
                    record.from,
                    record.to,
                    record.body,
                    content,
                    record.quoted_id,
                    record.ack.to_string(),
                    reactions,
                    record.timestamp.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update the ack status of an existing message. Missing rows are a no-op:
/// receipts can arrive for messages sent before this process existed.
pub async fn update_ack(
    db: &Database,
    tenant: &TenantId,
    message_id: &str,
    ack: AckStatus,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET ack = ?3
                 WHERE tenant_id = ?1 AND external_id = ?2",
                params![tenant.as_str(), message_id, ack.to_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a reaction keyed by sender and return the current reaction list.
///
/// An empty reaction text removes the sender's reaction.
pub async fn apply_reaction(
    db: &Database,
    tenant: &TenantId,
    message_id: &str,
    sender: &str,
    text: &str,
) -> Result<Vec<Reaction>, CourierError> {
    let tenant = tenant.clone();
    let message_id = message_id.to_string();
    let sender = sender.to_string();
    let text = text.to_string();
    db.connection()
        .call(move |conn| {
            let stored: Option<String> = conn
                .query_row(
                    "SELECT reactions FROM messages
                     WHERE tenant_id = ?1 AND external_id = ?2",
                    params![tenant.as_str(), message_id],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;

            let Some(stored) = stored else {
                // Reaction for an unknown message: nothing to update.
                return Ok(Vec::new());
            };

            let mut reactions: Vec<Reaction> =
                serde_json::from_str(&stored).unwrap_or_default();
            reactions.retain(|r| r.sender != sender);
            if !text.is_empty() {
                reactions.push(Reaction {
                    sender: sender.clone(),
                    text: text.clone(),
                });
            }

            let encoded =
                serde_json::to_string(&reactions).unwrap_or_else(|_| "[]".to_string());
            conn.execute(
                "UPDATE messages SET reactions = ?3
                 WHERE tenant_id = ?1 AND external_id = ?2",
                params![tenant.as_str(), message_id, encoded],
            )?;
            Ok(reactions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a message by its external id. Test and gateway helper.
pub async fn get_message(
    db: &Database,
    tenant: &TenantId,
    message_id: &str,
) -> Result<Option<MessageRecord>, CourierError> {
    let tenant = tenant.clone();
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT tenant_id, external_id, direction, chat_id, sender, recipient,
                        body, content, quoted_id, ack, reactions, timestamp
                 FROM messages WHERE tenant_id = ?1 AND external_id = ?2",
                params![tenant.as_str(), message_id],
                row_to_record,
            );
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<MessageRecord, rusqlite::Error> {
    let tenant: String = row.get(0)?;
    let direction: String = row.get(2)?;
    let chat_id: String = row.get(3)?;
    let content: String = row.get(7)?;
    let ack: String = row.get(9)?;
    let reactions: String = row.get(10)?;
    let timestamp: String = row.get(11)?;

    Ok(MessageRecord {
        tenant_id: TenantId(tenant),
        external_id: row.get(1)?,
        direction: MessageDirection::from_str(&direction)
            .unwrap_or(MessageDirection::Inbound),
        chat_id: ChatId(chat_id),
        from: row.get(4)?,
        to: row.get(5)?,
        body: row.get(6)?,
        content: serde_json::from_str::<MessageContent>(&content)
            .unwrap_or(MessageContent::Unspecified),
        quoted_id: row.get(8)?,
        ack: AckStatus::from_str(&ack).unwrap_or(AckStatus::Pending),
        reactions: serde_json::from_str(&reactions).unwrap_or_default(),
        timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map(|t| t.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}
