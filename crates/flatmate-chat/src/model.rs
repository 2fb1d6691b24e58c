// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored records and request/response shapes of the messaging subsystem.

use serde::{Deserialize, Serialize};

use flatmate_core::Millis;

use crate::identity::ConversationId;

/// The only delivery status the server ever writes.
pub const STATUS_SENT: &str = "sent";

/// Listing label used when the sender gave none.
pub const DEFAULT_LOCATION: &str = "Inquiry";

fn default_status() -> String {
    STATUS_SENT.to_string()
}

/// Optional pointer to the message being answered. Denormalized for display;
/// never checked against the target message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_to_sender: Option<String>,
}

/// A message as stored under `messages/{chat}/bucket_N/messages/{key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub sender_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: Millis,
    #[serde(default = "default_status")]
    pub status: String,
    /// Client idempotency token; the message key when the client sent none.
    #[serde(default)]
    pub client_msg_id: String,
    #[serde(flatten)]
    pub reply: ReplyRef,
}

/// A message together with its store key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMessage {
    pub id: String,
    #[serde(flatten)]
    pub record: MessageRecord,
}

/// Last message shown in conversation lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub timestamp: Millis,
}

/// Denormalized summary at `chats/{id}/metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub property_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
    #[serde(default = "default_location")]
    pub property_location: String,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

/// Body of a single send.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    #[serde(default)]
    pub receiver_id: String,
    #[serde(default)]
    pub property_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub property_location: Option<String>,
    #[serde(default)]
    pub client_msg_id: Option<String>,
    #[serde(flatten)]
    pub reply: ReplyRef,
}

/// Outcome of a single send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub chat_id: ConversationId,
    pub message_data: StoredMessage,
    pub remaining_messages: u32,
    /// Echo of the client's token so it can reconcile its optimistic copy.
    pub temp_id: Option<String>,
}

/// One queued message in a batch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<Millis>,
    #[serde(default)]
    pub client_msg_id: Option<String>,
    #[serde(flatten)]
    pub reply: ReplyRef,
}

/// Body of a batched send.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBulk {
    #[serde(default)]
    pub receiver_id: String,
    #[serde(default)]
    pub property_id: String,
    #[serde(default)]
    pub property_location: Option<String>,
    #[serde(default)]
    pub messages: Vec<BulkMessage>,
}

/// Outcome of a batched send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReceipt {
    pub remaining_messages: u32,
    /// Idempotency tokens of the messages that were stored, in order.
    pub processed_ids: Vec<String>,
}

/// A conversation as seen by one participant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    /// Newest first.
    pub messages: Vec<StoredMessage>,
    pub user_id: String,
    pub remaining_messages: u32,
    pub chat_id: ConversationId,
    pub phone_number: Option<String>,
    pub other_user_last_seen: Millis,
}

/// One row of a user's conversation list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub metadata: ConversationMetadata,
    pub partner_id: String,
    pub partner_name: String,
    pub partner_photo: Option<String>,
    pub partner_phone: Option<String>,
}

impl ConversationSummary {
    /// Sort key; conversations without a last message sort as 0.
    pub fn last_timestamp(&self) -> Millis {
        self.metadata
            .last_message
            .as_ref()
            .map(|m| m.timestamp)
            .unwrap_or(0)
    }
}

/// Short summary returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStatusSummary {
    pub chat_id: String,
    pub last_message: String,
    pub last_timestamp: Millis,
    pub property_location: String,
}

/// Whether a conversation already exists, with an id to use either way.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStatus {
    Exists(ChatStatusSummary),
    Missing { suggested_chat_id: String },
}
