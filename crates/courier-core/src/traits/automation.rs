// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Downstream automation seam (bot replies, keyword workflows).
//!
//! The event router invokes this after a short delay on each inbound
//! message; the actual automation engines live outside this subsystem.

use async_trait::async_trait;

use crate::types::{MessageRecord, TenantId};

#[async_trait]
pub trait AutomationHook: Send + Sync {
    /// Called once per persisted inbound message. Failures are logged by the
    /// router and never propagate.
    async fn on_message(&self, tenant: &TenantId, record: &MessageRecord);
}

/// Hook that does nothing. The default when no automation is wired.
#[derive(Debug, Default)]
pub struct NullAutomation;

#[async_trait]
impl AutomationHook for NullAutomation {
    async fn on_message(&self, _tenant: &TenantId, _record: &MessageRecord) {}
}
