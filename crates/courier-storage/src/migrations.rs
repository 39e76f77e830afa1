// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations tracked via `PRAGMA user_version`.
//!
//! Each entry in [`MIGRATIONS`] is applied at most once, in order, inside a
//! transaction. Migrations run automatically on database open.

/// Ordered migration steps. Never reorder or edit an applied step; append.
const MIGRATIONS: &[&str] = &[
    // v1: core schema.
    "CREATE TABLE messages (
        tenant_id    TEXT NOT NULL,
        external_id  TEXT NOT NULL,
        direction    TEXT NOT NULL,
        chat_id      TEXT NOT NULL,
        sender       TEXT NOT NULL,
        recipient    TEXT NOT NULL,
        body         TEXT NOT NULL,
        content      TEXT NOT NULL,
        quoted_id    TEXT,
        ack          TEXT NOT NULL,
        reactions    TEXT NOT NULL DEFAULT '[]',
        timestamp    TEXT NOT NULL,
        PRIMARY KEY (tenant_id, external_id)
    );

    CREATE TABLE conversations (
        id             TEXT PRIMARY KEY,
        tenant_id      TEXT NOT NULL,
        customer_phone TEXT NOT NULL,
        display_name   TEXT,
        assignee       TEXT,
        created_at     TEXT NOT NULL,
        UNIQUE (tenant_id, customer_phone)
    );

    CREATE TABLE campaign_deliveries (
        tenant_id   TEXT NOT NULL,
        campaign_id TEXT NOT NULL,
        phone       TEXT NOT NULL,
        status      TEXT NOT NULL,
        error       TEXT,
        created_at  TEXT NOT NULL,
        PRIMARY KEY (tenant_id, campaign_id, phone)
    );

    CREATE TABLE campaign_runs (
        tenant_id   TEXT NOT NULL,
        campaign_id TEXT NOT NULL,
        status      TEXT NOT NULL,
        sent        INTEGER NOT NULL DEFAULT 0,
        failed      INTEGER NOT NULL DEFAULT 0,
        message     TEXT,
        updated_at  TEXT NOT NULL,
        PRIMARY KEY (tenant_id, campaign_id)
    );

    CREATE TABLE tenant_settings (
        tenant_id           TEXT PRIMARY KEY,
        webhook_url         TEXT,
        webhook_secret      TEXT,
        auto_assign         INTEGER NOT NULL DEFAULT 0,
        last_assigned_index INTEGER NOT NULL DEFAULT -1
    );

    CREATE TABLE team_members (
        id         TEXT PRIMARY KEY,
        tenant_id  TEXT NOT NULL,
        name       TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE customers (
        tenant_id TEXT NOT NULL,
        phone     TEXT NOT NULL,
        name      TEXT NOT NULL,
        active    INTEGER NOT NULL DEFAULT 1,
        segment   TEXT,
        PRIMARY KEY (tenant_id, phone)
    );

    CREATE TABLE contacts (
        tenant_id TEXT NOT NULL,
        phone     TEXT NOT NULL,
        name      TEXT NOT NULL,
        segment   TEXT,
        PRIMARY KEY (tenant_id, phone)
    );

    CREATE INDEX idx_messages_tenant_chat ON messages (tenant_id, chat_id);
    CREATE INDEX idx_deliveries_status ON campaign_deliveries (tenant_id, campaign_id, status);
    CREATE INDEX idx_team_members_tenant ON team_members (tenant_id, created_at);",
];

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (i, sql) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i64;
        if version <= current {
            continue;
        }
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }

    Ok(())
}
