// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier messaging platform.

use thiserror::Error;

use crate::types::SessionStatus;

/// The primary error type used across all Courier components.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging-client errors (initialize failure, send rejection, network loss).
    #[error("messenger error: {message}")]
    Messenger {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An operation required a ready session but the tenant's session is not ready.
    ///
    /// Callers should prompt a reconnect rather than retrying blindly.
    #[error("client not ready: session is {status}")]
    NotReady { status: SessionStatus },

    /// A recipient could not be resolved to a protocol-addressable chat identifier.
    ///
    /// Never retried automatically: the same input cannot resolve differently.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Webhook delivery failed after all retry attempts.
    #[error("webhook delivery failed: {0}")]
    Webhook(String),

    /// Campaign-level failures (session dropped mid-run, no recipients persisted).
    #[error("campaign error: {0}")]
    Campaign(String),

    /// Credential store errors (blob read/write/delete).
    #[error("credential store error: {0}")]
    Credential(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Shorthand for a messenger error without an underlying source.
    pub fn messenger(message: impl Into<String>) -> Self {
        CourierError::Messenger {
            message: message.into(),
            source: None,
        }
    }

    /// True when the error indicates the session was not ready.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, CourierError::NotReady { .. })
    }
}
