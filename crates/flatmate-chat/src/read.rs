// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation read path.

use serde_json::{json, Value};
use tracing::{debug, warn};

use flatmate_core::{now_millis, FlatmateError, Namespace};

use crate::identity::ConversationId;
use crate::model::{ConversationView, MessageRecord, StoredMessage};
use crate::paths::{ChatPaths, CURRENT_BUCKET};
use crate::profile::fetch_profile;
use crate::service::ChatService;

impl ChatService {
    /// Read the newest messages of a conversation, newest first.
    ///
    /// Only a participant may read. Reading records the reader's last-seen
    /// time before the messages are fetched.
    pub async fn read(
        &self,
        ns: &Namespace,
        reader: &str,
        chat_id: &str,
    ) -> Result<ConversationView, FlatmateError> {
        let forbidden = || FlatmateError::Forbidden("not a participant of this conversation".to_string());
        let chat = ConversationId::parse(chat_id).map_err(|_| forbidden())?;
        let Some(other) = chat.other_participant(reader) else {
            warn!(tenant = %ns.name(), chat_id = %chat, reader = %reader, "read refused for non-participant");
            return Err(forbidden());
        };
        let paths = ChatPaths::new(ns, &chat);

        ns.store()
            .set(&paths.last_seen(reader)?, json!(now_millis()))
            .await?;

        let raw = ns
            .store()
            .limit_to_last(&paths.messages(CURRENT_BUCKET)?, self.config.read_limit)
            .await?;
        let mut messages: Vec<StoredMessage> = raw.into_iter().filter_map(decode).collect();
        messages.sort_by(|a, b| {
            b.record
                .timestamp
                .cmp(&a.record.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });

        let other_seen_path = paths.last_seen(other)?;
        let (profile, other_seen, (_, _, used)) = futures::try_join!(
            fetch_profile(ns, other),
            ns.store().get(&other_seen_path),
            self.ledger.used(ns, &chat, reader),
        )?;

        debug!(chat_id = %chat, count = messages.len(), "conversation read");
        Ok(ConversationView {
            messages,
            user_id: reader.to_string(),
            remaining_messages: self.ledger.remaining(used),
            phone_number: profile.and_then(|p| p.phone_number),
            other_user_last_seen: other_seen.as_ref().and_then(Value::as_i64).unwrap_or(0),
            chat_id: chat,
        })
    }
}

fn decode((id, value): (String, Value)) -> Option<StoredMessage> {
    match serde_json::from_value::<MessageRecord>(value) {
        Ok(mut record) => {
            if record.client_msg_id.is_empty() {
                record.client_msg_id = id.clone();
            }
            Some(StoredMessage { id, record })
        }
        Err(e) => {
            warn!(key = %id, error = %e, "skipping unreadable message record");
            None
        }
    }
}
