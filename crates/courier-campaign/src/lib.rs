// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk broadcast ("campaign") sending for the Courier platform.

pub mod broadcaster;

pub use broadcaster::CampaignBroadcaster;
