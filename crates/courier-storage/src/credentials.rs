// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-based credential store: one opaque blob per tenant.
//!
//! The blob is written by the messaging client on first successful pairing
//! and deleted on reset/logout. Courier never parses it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use courier_core::{CourierError, CredentialStore, TenantId};

/// Stores credential blobs as files under a configured directory.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn blob_path(&self, tenant: &TenantId) -> PathBuf {
        // Tenant ids come from the platform, but sanitize path separators anyway.
        let safe: String = tenant
            .as_str()
            .chars()
            .map(|c| if c == '/' || c == '\\' || c == '.' { '_' } else { c })
            .collect();
        self.dir.join(format!("{safe}.cred"))
    }

    fn map_io(e: std::io::Error) -> CourierError {
        CourierError::Credential(e.to_string())
    }

    async fn ensure_dir(&self) -> Result<(), CourierError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(Self::map_io)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn exists(&self, tenant: &TenantId) -> Result<bool, CourierError> {
        Ok(Path::exists(&self.blob_path(tenant)))
    }

    async fn save(&self, tenant: &TenantId, blob: &[u8]) -> Result<(), CourierError> {
        self.ensure_dir().await?;
        tokio::fs::write(self.blob_path(tenant), blob)
            .await
            .map_err(Self::map_io)?;
        debug!(tenant = %tenant, "credential blob saved");
        Ok(())
    }

    async fn delete(&self, tenant: &TenantId) -> Result<(), CourierError> {
        match tokio::fs::remove_file(self.blob_path(tenant)).await {
            Ok(()) => {
                debug!(tenant = %tenant, "credential blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io(e)),
        }
    }
}
