// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification feed for the Flatmate backend.
//!
//! Merges a user's visit events, offers, and reviews of the listings they own
//! into one typed feed with per-item and bulk read state.

pub mod aggregator;
pub mod model;
pub mod source;

pub use aggregator::NotificationAggregator;
pub use model::{MarkRead, NotificationItem};
pub use source::{NotificationKind, Source};
