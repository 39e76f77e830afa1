// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat identifier resolution.
//!
//! Two-tier resolution: canonical validation requires a live network round
//! trip that is not always available or necessary, so a missing or failing
//! session falls back to constructing a default person identifier from the
//! digits (best-effort, not guaranteed deliverable).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use courier_core::types::{ChatId, TenantId};
use courier_core::CourierError;
use courier_config::model::{CacheConfig, ResolverConfig};
use courier_session::SessionRegistry;

use crate::cache::ContactCache;

pub struct ChatIdResolver {
    registry: Arc<SessionRegistry>,
    cache: ContactCache,
    config: ResolverConfig,
}

impl ChatIdResolver {
    pub fn new(
        registry: Arc<SessionRegistry>,
        config: ResolverConfig,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            registry,
            cache: ContactCache::new(Duration::from_secs(cache_config.contact_ttl_secs)),
            config,
        }
    }

    /// Normalize arbitrary input into either an already-qualified chat id
    /// (returned unchanged) or a bare digit string pending resolution.
    ///
    /// Returns `None` for empty results and for digit strings outside the
    /// configured bounds: anything longer than a real phone number is an
    /// internal network identifier, not a dialable number.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if self.is_qualified(trimmed) {
            return Some(trimmed.to_string());
        }

        let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty()
            || digits.len() < self.config.min_phone_digits
            || digits.len() > self.config.max_phone_digits
        {
            return None;
        }
        Some(digits)
    }

    /// Resolve raw input into a protocol-addressable chat identifier.
    pub async fn resolve(&self, tenant: &TenantId, raw: &str) -> Result<ChatId, CourierError> {
        let normalized = self
            .normalize(raw)
            .ok_or_else(|| CourierError::InvalidRecipient(raw.trim().to_string()))?;

        if self.is_qualified(&normalized) {
            return Ok(ChatId(normalized));
        }
        let digits = normalized;

        if let Some(cached) = self.cache.lookup(tenant, &digits) {
            return Ok(cached);
        }

        if let Some(client) = self.registry.client(tenant) {
            match client.validate_number(&digits).await {
                Ok(Some(canonical)) => {
                    self.cache.store(tenant, &digits, canonical.clone(), None);
                    return Ok(canonical);
                }
                Ok(None) => {
                    debug!(tenant = %tenant, "number unknown to the network, using fallback id");
                }
                Err(e) => {
                    warn!(tenant = %tenant, error = %e, "number validation failed, using fallback id");
                }
            }
        }

        Ok(ChatId(format!("{digits}{}", self.config.person_suffix)))
    }

    /// Whether the input already carries a recognized addressing suffix.
    pub fn is_qualified(&self, input: &str) -> bool {
        input.ends_with(&self.config.person_suffix) || input.ends_with(&self.config.group_suffix)
    }

    /// Stricter check used before media sends, which are less tolerant of
    /// malformed identifiers than text sends.
    pub fn is_strict_valid(&self, chat: &ChatId) -> bool {
        if let Some(user) = chat.as_str().strip_suffix(&self.config.person_suffix) {
            return !user.is_empty()
                && user.chars().all(|c| c.is_ascii_digit())
                && user.len() >= self.config.min_phone_digits
                && user.len() <= self.config.max_phone_digits;
        }
        if let Some(user) = chat.as_str().strip_suffix(&self.config.group_suffix) {
            // Group ids are network-internal and may exceed phone length;
            // they only need to be non-empty digits.
            return !user.is_empty() && user.chars().all(|c| c.is_ascii_digit());
        }
        false
    }

    pub fn cache(&self) -> &ContactCache {
        &self.cache
    }
}
