// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits for Courier's external collaborators.

pub mod automation;
pub mod credentials;
pub mod messenger;
pub mod publisher;
pub mod store;

pub use automation::{AutomationHook, NullAutomation};
pub use credentials::CredentialStore;
pub use messenger::{MessengerClient, MessengerFactory, RemoteChat, EVENT_QUEUE_CAPACITY};
pub use publisher::{NullPublisher, RealtimePublisher};
pub use store::DataStore;
