// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory credential store for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use courier_core::{CourierError, CredentialStore, TenantId};

/// Credential blobs held in a map, with delete counting for assertions.
#[derive(Default)]
pub struct MemoryCredentials {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    deletes: Mutex<Vec<String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob as if pairing had already succeeded.
    pub fn seed(&self, tenant: &TenantId) {
        self.blobs
            .lock()
            .expect("credentials lock")
            .insert(tenant.as_str().to_string(), b"blob".to_vec());
    }

    /// Tenants whose credentials were deleted, in order.
    pub fn deleted_tenants(&self) -> Vec<String> {
        self.deletes.lock().expect("credentials lock").clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn exists(&self, tenant: &TenantId) -> Result<bool, CourierError> {
        Ok(self
            .blobs
            .lock()
            .expect("credentials lock")
            .contains_key(tenant.as_str()))
    }

    async fn save(&self, tenant: &TenantId, blob: &[u8]) -> Result<(), CourierError> {
        self.blobs
            .lock()
            .expect("credentials lock")
            .insert(tenant.as_str().to_string(), blob.to_vec());
        Ok(())
    }

    async fn delete(&self, tenant: &TenantId) -> Result<(), CourierError> {
        self.blobs
            .lock()
            .expect("credentials lock")
            .remove(tenant.as_str());
        self.deletes
            .lock()
            .expect("credentials lock")
            .push(tenant.as_str().to_string());
        Ok(())
    }
}
