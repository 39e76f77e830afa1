// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential-store collaborator trait.
//!
//! One opaque blob per tenant: created by the client library on first
//! successful pairing, deleted on reset/logout. Courier never inspects the
//! blob's contents.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::TenantId;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// True if credential material exists for the tenant.
    async fn exists(&self, tenant: &TenantId) -> Result<bool, CourierError>;

    /// Stores (replaces) the tenant's credential blob.
    async fn save(&self, tenant: &TenantId, blob: &[u8]) -> Result<(), CourierError>;

    /// Deletes the tenant's credential material. Deleting an absent blob is
    /// not an error.
    async fn delete(&self, tenant: &TenantId) -> Result<(), CourierError>;
}
