// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier messaging platform.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Courier workspace. The session manager,
//! dispatcher, broadcaster, and gateway are all written against the
//! capability traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use types::{ChatId, MessengerEvent, SessionSnapshot, SessionStatus, TenantId};

// Re-export all capability traits at crate root.
pub use traits::{
    AutomationHook, CredentialStore, DataStore, MessengerClient, MessengerFactory,
    NullAutomation, NullPublisher, RealtimePublisher, RemoteChat,
};
