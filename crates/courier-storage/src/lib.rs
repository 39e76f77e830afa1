// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Courier platform.
//!
//! Implements the `DataStore` capability trait over a single tokio-rusqlite
//! connection, plus a file-based credential store. Schema migrations are
//! embedded and run on open.

pub mod adapter;
pub mod credentials;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use credentials::FileCredentialStore;
pub use database::Database;
