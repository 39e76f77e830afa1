// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides a deterministic fake messaging client, an in-memory data store,
//! an in-memory credential store, and a recording realtime publisher.

pub mod memory_credentials;
pub mod memory_store;
pub mod mock_messenger;
pub mod recording_publisher;

pub use memory_credentials::MemoryCredentials;
pub use memory_store::{CampaignRunRow, MemoryDataStore};
pub use mock_messenger::{MockMessenger, MockMessengerFactory, SentMessage};
pub use recording_publisher::RecordingPublisher;
