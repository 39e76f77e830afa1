// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed webhook delivery with bounded retry.
//!
//! Payloads are serialized exactly once; the optional HMAC-SHA256 signature
//! is computed over those exact bytes and sent in the `X-Signature` header.
//! Exhausted deliveries are logged and dropped; there is no dead-letter
//! queue.

pub mod notifier;

pub use notifier::WebhookNotifier;
