// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-party, listing-scoped messaging.
//!
//! A conversation is identified by its two participants and the listing it
//! is about. Each sender may post a fixed number of messages per
//! conversation; every send updates the message bucket, conversation
//! metadata, quota counter and both users' indexes in one atomic write.

pub mod identity;
pub mod list;
pub mod model;
pub mod paths;
pub mod profile;
pub mod quota;
pub mod read;
pub mod sanitize;
pub mod send;
pub mod service;
pub mod status;

pub use identity::ConversationId;
pub use model::{
    BulkMessage, BulkReceipt, ChatStatus, ChatStatusSummary, ConversationMetadata,
    ConversationSummary, ConversationView, LastMessage, MessageRecord, ReplyRef, SendBulk,
    SendMessage, SendReceipt, StoredMessage, DEFAULT_LOCATION,
};
pub use profile::{fetch_profile, UserProfile, DEFAULT_DISPLAY_NAME};
pub use quota::{QuotaLedger, Reservation};
pub use service::ChatService;
