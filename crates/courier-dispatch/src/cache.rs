// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-TTL cache of resolved contact identities.
//!
//! Avoids a network round-trip for every send to a recently-validated
//! number. Entries are owned exclusively by this cache and expire after a
//! fixed TTL; lookups evict stale entries in passing.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use courier_core::types::{ChatId, TenantId};

struct CacheEntry {
    chat_id: ChatId,
    display_name: Option<String>,
    cached_at: Instant,
}

/// Tenant+phone -> resolved identity, with TTL expiry.
pub struct ContactCache {
    ttl: Duration,
    entries: DashMap<(String, String), CacheEntry>,
}

impl ContactCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Fresh resolved identity for `phone`, if cached.
    pub fn lookup(&self, tenant: &TenantId, phone: &str) -> Option<ChatId> {
        let key = (tenant.as_str().to_string(), phone.to_string());
        if let Some(entry) = self.entries.get(&key) {
            if entry.cached_at.elapsed() < self.ttl {
                return Some(entry.chat_id.clone());
            }
        }
        // Stale or absent; drop a stale entry in passing.
        self.entries
            .remove_if(&key, |_, entry| entry.cached_at.elapsed() >= self.ttl);
        None
    }

    pub fn store(
        &self,
        tenant: &TenantId,
        phone: &str,
        chat_id: ChatId,
        display_name: Option<String>,
    ) {
        self.entries.insert(
            (tenant.as_str().to_string(), phone.to_string()),
            CacheEntry {
                chat_id,
                display_name,
                cached_at: Instant::now(),
            },
        );
    }

    /// Cached display name, if any.
    pub fn display_name(&self, tenant: &TenantId, phone: &str) -> Option<String> {
        let key = (tenant.as_str().to_string(), phone.to_string());
        self.entries
            .get(&key)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .and_then(|entry| entry.display_name.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl() {
        let cache = ContactCache::new(Duration::from_secs(1800));
        let tenant = TenantId::from("acme");
        cache.store(
            &tenant,
            "201001234567",
            ChatId("201001234567@c.us".into()),
            Some("Samir".into()),
        );

        tokio::time::advance(Duration::from_secs(60)).await;
        let hit = cache.lookup(&tenant, "201001234567");
        assert_eq!(hit.unwrap().as_str(), "201001234567@c.us");
        assert_eq!(
            cache.display_name(&tenant, "201001234567").as_deref(),
            Some("Samir")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = ContactCache::new(Duration::from_secs(1800));
        let tenant = TenantId::from("acme");
        cache.store(&tenant, "201001234567", ChatId("201001234567@c.us".into()), None);

        tokio::time::advance(Duration::from_secs(1801)).await;
        assert!(cache.lookup(&tenant, "201001234567").is_none());
        assert!(cache.is_empty(), "stale entry evicted in passing");
    }

    #[tokio::test(start_paused = true)]
    async fn entries_are_tenant_scoped() {
        let cache = ContactCache::new(Duration::from_secs(1800));
        cache.store(
            &TenantId::from("acme"),
            "201001234567",
            ChatId("201001234567@c.us".into()),
            None,
        );
        assert!(cache
            .lookup(&TenantId::from("globex"), "201001234567")
            .is_none());
    }
}
