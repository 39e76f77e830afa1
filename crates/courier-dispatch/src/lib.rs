// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat identifier resolution and outbound dispatch for the Courier
//! platform.

pub mod cache;
pub mod dispatcher;
pub mod resolver;

pub use cache::ContactCache;
pub use dispatcher::{MessageDispatcher, StructuredMessage};
pub use resolver::ChatIdResolver;
