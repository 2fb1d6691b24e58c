// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The atomic send path.
//!
//! A send is one multi-path write covering the message record, the bucket's
//! self-description, the conversation metadata, the sender's last-seen
//! time, the quota counter and both participants' conversation index
//! entries. Either all of them land or none do.

use serde_json::{json, Value};
use tracing::{debug, info};

use flatmate_core::{now_millis, FlatmateError, Namespace, StorePath};

use crate::identity::ConversationId;
use crate::model::{
    BulkReceipt, ConversationMetadata, LastMessage, MessageRecord, SendBulk, SendMessage,
    SendReceipt, StoredMessage, DEFAULT_LOCATION, STATUS_SENT,
};
use crate::paths::{ChatPaths, CURRENT_BUCKET};
use crate::quota::Reservation;
use crate::sanitize;
use crate::service::{ChatService, CAS_ATTEMPTS};

fn location_or_default(location: Option<String>) -> String {
    location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
}

fn contended(chat: &ConversationId) -> FlatmateError {
    FlatmateError::Internal(format!(
        "quota counter for {chat} kept changing; giving up after {CAS_ATTEMPTS} attempts"
    ))
}

impl ChatService {
    /// Send one message from `sender`.
    pub async fn send(
        &self,
        ns: &Namespace,
        sender: &str,
        request: SendMessage,
    ) -> Result<SendReceipt, FlatmateError> {
        let body = sanitize::validate_body(&request.message, self.config.max_message_chars)?;
        let chat = ConversationId::new(sender, &request.receiver_id, &request.property_id)?;
        let sender = sender.trim();
        let receiver = request.receiver_id.trim();
        let location = location_or_default(request.property_location.clone());
        let client_token = request.client_msg_id.clone().filter(|t| !t.is_empty());
        let paths = ChatPaths::new(ns, &chat);

        for attempt in 1..=CAS_ATTEMPTS {
            let reservation = self.ledger.check_and_reserve(ns, &chat, sender).await?;
            let key = ns.store().push_key();
            let timestamp = now_millis();

            let record = MessageRecord {
                sender_id: sender.to_string(),
                text: body.clone(),
                timestamp,
                status: STATUS_SENT.to_string(),
                client_msg_id: client_token.clone().unwrap_or_else(|| key.clone()),
                reply: request.reply.clone(),
            };
            let metadata = ConversationMetadata {
                chat_id: chat.to_string(),
                participants: vec![sender.to_string(), receiver.to_string()],
                property_id: chat.listing().to_string(),
                last_message: Some(LastMessage {
                    text: body.clone(),
                    sender_id: sender.to_string(),
                    timestamp,
                }),
                property_location: location.clone(),
            };

            let bucket = paths.bucket(CURRENT_BUCKET)?;
            let updates: Vec<(StorePath, Value)> = vec![
                (paths.message(CURRENT_BUCKET, &key)?, serde_json::to_value(&record)?),
                (bucket.child("bucketId")?, json!(CURRENT_BUCKET)),
                (bucket.child("chatId")?, json!(chat.as_str())),
                (paths.metadata()?, serde_json::to_value(&metadata)?),
                (paths.last_seen(sender)?, json!(timestamp)),
                (reservation.path.clone(), json!(reservation.next_count())),
                (paths.user_index(sender)?, json!(true)),
                (paths.user_index(receiver)?, json!(true)),
            ];

            if self.commit(ns, &reservation, updates).await? {
                let remaining = self.ledger.remaining(reservation.next_count());
                info!(
                    tenant = %ns.name(),
                    chat_id = %chat,
                    sender = %sender,
                    remaining,
                    "message sent"
                );
                return Ok(SendReceipt {
                    message_data: StoredMessage { id: key, record },
                    chat_id: chat,
                    remaining_messages: remaining,
                    temp_id: client_token,
                });
            }
            debug!(chat_id = %chat, attempt, "quota counter moved during send, retrying");
        }

        Err(contended(&chat))
    }

    /// Send a queue of messages, accepting as many as the quota still allows.
    ///
    /// Bodies are stripped and cut to the length limit rather than rejected;
    /// bodies left empty are skipped and consume no quota.
    pub async fn send_bulk(
        &self,
        ns: &Namespace,
        sender: &str,
        request: SendBulk,
    ) -> Result<BulkReceipt, FlatmateError> {
        if request.messages.is_empty() {
            return Err(FlatmateError::Validation("no messages to send".to_string()));
        }
        let chat = ConversationId::new(sender, &request.receiver_id, &request.property_id)?;
        let sender = sender.trim();
        let receiver = request.receiver_id.trim();
        let location = location_or_default(request.property_location.clone());
        let paths = ChatPaths::new(ns, &chat);
        let wanted = u32::try_from(request.messages.len()).unwrap_or(u32::MAX);

        for attempt in 1..=CAS_ATTEMPTS {
            let reservation = self.ledger.reserve_batch(ns, &chat, sender, wanted).await?;
            let mut updates: Vec<(StorePath, Value)> = Vec::new();
            let mut saved: Vec<MessageRecord> = Vec::new();

            for queued in &request.messages {
                if saved.len() >= reservation.granted as usize {
                    break;
                }
                let Some(text) = sanitize::clean_batched(&queued.text, self.config.max_message_chars)
                else {
                    continue;
                };
                let key = ns.store().push_key();
                let record = MessageRecord {
                    sender_id: sender.to_string(),
                    text,
                    timestamp: queued.timestamp.unwrap_or_else(now_millis),
                    status: STATUS_SENT.to_string(),
                    client_msg_id: queued
                        .client_msg_id
                        .clone()
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| key.clone()),
                    reply: queued.reply.clone(),
                };
                updates.push((
                    paths.message(CURRENT_BUCKET, &key)?,
                    serde_json::to_value(&record)?,
                ));
                saved.push(record);
            }

            let Some(last) = saved.last() else {
                debug!(chat_id = %chat, "bulk send had nothing to store");
                return Ok(BulkReceipt {
                    remaining_messages: self.ledger.remaining(reservation.used),
                    processed_ids: Vec::new(),
                });
            };

            let processed = u32::try_from(saved.len()).unwrap_or(u32::MAX);
            let next_count = reservation.used + processed;
            let metadata = paths.metadata()?;
            let bucket = paths.bucket(CURRENT_BUCKET)?;
            updates.extend([
                (bucket.child("bucketId")?, json!(CURRENT_BUCKET)),
                (bucket.child("chatId")?, json!(chat.as_str())),
                (metadata.child("chatId")?, json!(chat.as_str())),
                (metadata.child("participants")?, json!([sender, receiver])),
                (metadata.child("propertyId")?, json!(chat.listing())),
                (metadata.child("propertyLocation")?, json!(location)),
                (
                    metadata.child("lastMessage")?,
                    serde_json::to_value(LastMessage {
                        text: last.text.clone(),
                        sender_id: sender.to_string(),
                        timestamp: last.timestamp,
                    })?,
                ),
                (paths.last_seen(sender)?, json!(now_millis())),
                (reservation.path.clone(), json!(next_count)),
                (paths.user_index(sender)?, json!(true)),
                (paths.user_index(receiver)?, json!(true)),
            ]);

            if self.commit(ns, &reservation, updates).await? {
                let remaining = self.ledger.remaining(next_count);
                info!(
                    tenant = %ns.name(),
                    chat_id = %chat,
                    sender = %sender,
                    count = processed,
                    queued = request.messages.len(),
                    remaining,
                    "bulk messages sent"
                );
                return Ok(BulkReceipt {
                    remaining_messages: remaining,
                    processed_ids: saved.into_iter().map(|r| r.client_msg_id).collect(),
                });
            }
            debug!(chat_id = %chat, attempt, "quota counter moved during bulk send, retrying");
        }

        Err(contended(&chat))
    }

    /// Apply a send's updates. With strict quotas the write only lands if the
    /// counter still holds the value the reservation saw.
    async fn commit(
        &self,
        ns: &Namespace,
        reservation: &Reservation,
        updates: Vec<(StorePath, Value)>,
    ) -> Result<bool, FlatmateError> {
        if self.config.strict_quota {
            ns.store()
                .guarded_update(&reservation.path, reservation.observed.clone(), updates)
                .await
        } else {
            ns.store().multi_update(updates).await?;
            Ok(true)
        }
    }
}
