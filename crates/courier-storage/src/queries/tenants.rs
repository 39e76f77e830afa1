// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant settings, team, audience, and conversation operations.

use courier_core::types::{
    ContactRecord, Conversation, CustomerRecord, TeamMember, TenantId, TenantSettings,
};
use courier_core::CourierError;
use rusqlite::params;

use crate::database::Database;

/// Read tenant settings, defaulting when no row exists yet.
pub async fn tenant_settings(
    db: &Database,
    tenant: &TenantId,
) -> Result<TenantSettings, CourierError> {
    let tenant = tenant.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT webhook_url, webhook_secret, auto_assign, last_assigned_index
                 FROM tenant_settings WHERE tenant_id = ?1",
                params![tenant.as_str()],
                |row| {
                    Ok(TenantSettings {
                        webhook_url: row.get(0)?,
                        webhook_secret: row.get(1)?,
                        auto_assign: row.get::<_, i64>(2)? != 0,
                        last_assigned_index: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(settings) => Ok(settings),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(TenantSettings {
                    last_assigned_index: -1,
                    ..TenantSettings::default()
                }),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Write (replace) tenant settings.
pub async fn set_tenant_settings(
    db: &Database,
    tenant: &TenantId,
    settings: &TenantSettings,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let settings = settings.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tenant_settings
                   (tenant_id, webhook_url, webhook_secret, auto_assign, last_assigned_index)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (tenant_id) DO UPDATE SET
                   webhook_url = excluded.webhook_url,
                   webhook_secret = excluded.webhook_secret,
                   auto_assign = excluded.auto_assign,
                   last_assigned_index = excluded.last_assigned_index",
                params![
                    tenant.as_str(),
                    settings.webhook_url,
                    settings.webhook_secret,
                    settings.auto_assign as i64,
                    settings.last_assigned_index,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist only the last-assigned round-robin index.
pub async fn set_last_assigned_index(
    db: &Database,
    tenant: &TenantId,
    index: i64,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tenant_settings (tenant_id, last_assigned_index)
                 VALUES (?1, ?2)
                 ON CONFLICT (tenant_id) DO UPDATE SET
                   last_assigned_index = excluded.last_assigned_index",
                params![tenant.as_str(), index],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Team members in stable creation order.
pub async fn team_members(
    db: &Database,
    tenant: &TenantId,
) -> Result<Vec<TeamMember>, CourierError> {
    let tenant = tenant.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name FROM team_members
                 WHERE tenant_id = ?1 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![tenant.as_str()], |row| {
                Ok(TeamMember {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?;
            let mut members = Vec::new();
            for row in rows {
                members.push(row?);
            }
            Ok(members)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Add a team member. Used by the platform's team management surface.
pub async fn add_team_member(
    db: &Database,
    tenant: &TenantId,
    member: &TeamMember,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let member = member.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO team_members (id, tenant_id, name, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    member.id,
                    tenant.as_str(),
                    member.name,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Customer records for campaign audience gathering.
pub async fn list_customers(
    db: &Database,
    tenant: &TenantId,
) -> Result<Vec<CustomerRecord>, CourierError> {
    let tenant = tenant.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT phone, name, active, segment FROM customers WHERE tenant_id = ?1",
            )?;
            let rows = stmt.query_map(params![tenant.as_str()], |row| {
                Ok(CustomerRecord {
                    phone: row.get(0)?,
                    name: row.get(1)?,
                    active: row.get::<_, i64>(2)? != 0,
                    segment: row.get(3)?,
                })
            })?;
            let mut customers = Vec::new();
            for row in rows {
                customers.push(row?);
            }
            Ok(customers)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Contact records, the second campaign audience source.
pub async fn list_contacts(
    db: &Database,
    tenant: &TenantId,
) -> Result<Vec<ContactRecord>, CourierError> {
    let tenant = tenant.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn
                .prepare("SELECT phone, name, segment FROM contacts WHERE tenant_id = ?1")?;
            let rows = stmt.query_map(params![tenant.as_str()], |row| {
                Ok(ContactRecord {
                    phone: row.get(0)?,
                    name: row.get(1)?,
                    segment: row.get(2)?,
                })
            })?;
            let mut contacts = Vec::new();
            for row in rows {
                contacts.push(row?);
            }
            Ok(contacts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Seed a customer row. Used by the platform surface and tests.
pub async fn upsert_customer(
    db: &Database,
    tenant: &TenantId,
    customer: &CustomerRecord,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let customer = customer.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO customers (tenant_id, phone, name, active, segment)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    tenant.as_str(),
                    customer.phone,
                    customer.name,
                    customer.active as i64,
                    customer.segment,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Seed a contact row. Used by the platform surface and tests.
pub async fn upsert_contact(
    db: &Database,
    tenant: &TenantId,
    contact: &ContactRecord,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let contact = contact.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO contacts (tenant_id, phone, name, segment)
                 VALUES (?1, ?2, ?3, ?4)",
                params![tenant.as_str(), contact.phone, contact.name, contact.segment],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return the conversation for a customer phone, creating it if absent.
pub async fn resolve_conversation(
    db: &Database,
    tenant: &TenantId,
    phone: &str,
    display_name: Option<&str>,
) -> Result<Conversation, CourierError> {
    let tenant = tenant.clone();
    let phone = phone.to_string();
    let display_name = display_name.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let existing = conn.query_row(
                "SELECT id, customer_phone, assignee FROM conversations
                 WHERE tenant_id = ?1 AND customer_phone = ?2",
                params![tenant.as_str(), phone],
                |row| {
                    Ok(Conversation {
                        id: row.get(0)?,
                        tenant_id: tenant.clone(),
                        customer_phone: row.get(1)?,
                        assignee: row.get(2)?,
                    })
                },
            );
            match existing {
                Ok(conversation) => Ok(conversation),
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    let id = format!("conv-{}-{}", tenant.as_str(), phone);
                    conn.execute(
                        "INSERT OR IGNORE INTO conversations
                           (id, tenant_id, customer_phone, display_name, assignee, created_at)
                         VALUES (?1, ?2, ?3, ?4, NULL, ?5)",
                        params![
                            id,
                            tenant.as_str(),
                            phone,
                            display_name,
                            chrono::Utc::now().to_rfc3339(),
                        ],
                    )?;
                    Ok(Conversation {
                        id,
                        tenant_id: tenant.clone(),
                        customer_phone: phone.clone(),
                        assignee: None,
                    })
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace a conversation's stored customer phone (self-healing path).
pub async fn update_conversation_phone(
    db: &Database,
    tenant: &TenantId,
    conversation_id: &str,
    phone: &str,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let conversation_id = conversation_id.to_string();
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE OR IGNORE conversations SET customer_phone = ?3
                 WHERE tenant_id = ?1 AND id = ?2",
                params![tenant.as_str(), conversation_id, phone],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Assign a conversation to a team member.
pub async fn assign_conversation(
    db: &Database,
    tenant: &TenantId,
    conversation_id: &str,
    member_id: &str,
) -> Result<(), CourierError> {
    let tenant = tenant.clone();
    let conversation_id = conversation_id.to_string();
    let member_id = member_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET assignee = ?3
                 WHERE tenant_id = ?1 AND id = ?2",
                params![tenant.as_str(), conversation_id, member_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn settings_default_when_missing() {
        let (db, _dir) = setup_db().await;
        let settings = tenant_settings(&db, &TenantId::from("acme")).await.unwrap();
        assert!(settings.webhook_url.is_none());
        assert!(!settings.auto_assign);
        assert_eq!(settings.last_assigned_index, -1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let (db, _dir) = setup_db().await;
        let tenant = TenantId::from("acme");
        let settings = TenantSettings {
            webhook_url: Some("https://example.com/hook".to_string()),
            webhook_secret: Some("s3cret".to_string()),
            auto_assign: true,
            last_assigned_index: 2,
        };
        set_tenant_settings(&db, &tenant, &settings).await.unwrap();

        let loaded = tenant_settings(&db, &tenant).await.unwrap();
        assert_eq!(loaded.webhook_url.as_deref(), Some("https://example.com/hook"));
        assert!(loaded.auto_assign);
        assert_eq!(loaded.last_assigned_index, 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn last_assigned_index_upserts_without_settings_row() {
        let (db, _dir) = setup_db().await;
        let tenant = TenantId::from("acme");
        set_last_assigned_index(&db, &tenant, 1).await.unwrap();
        let settings = tenant_settings(&db, &tenant).await.unwrap();
        assert_eq!(settings.last_assigned_index, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn team_members_in_creation_order() {
        let (db, _dir) = setup_db().await;
        let tenant = TenantId::from("acme");
        for (id, name) in [("tm-1", "Amira"), ("tm-2", "Omar"), ("tm-3", "Nadia")] {
            add_team_member(
                &db,
                &tenant,
                &TeamMember {
                    id: id.to_string(),
                    name: name.to_string(),
                },
            )
            .await
            .unwrap();
        }
        let members = team_members(&db, &tenant).await.unwrap();
        let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["tm-1", "tm-2", "tm-3"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conversation_resolve_creates_then_reuses() {
        let (db, _dir) = setup_db().await;
        let tenant = TenantId::from("acme");
        let first = resolve_conversation(&db, &tenant, "201001234567", Some("Samir"))
            .await
            .unwrap();
        let second = resolve_conversation(&db, &tenant, "201001234567", None)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conversation_phone_heals() {
        let (db, _dir) = setup_db().await;
        let tenant = TenantId::from("acme");
        let conversation = resolve_conversation(&db, &tenant, "120363000000001234", None)
            .await
            .unwrap();
        update_conversation_phone(&db, &tenant, &conversation.id, "201001234567")
            .await
            .unwrap();
        let healed = resolve_conversation(&db, &tenant, "201001234567", None)
            .await
            .unwrap();
        assert_eq!(healed.id, conversation.id);
        db.close().await.unwrap();
    }
}
