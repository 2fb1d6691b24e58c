// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde_json::Value;

use flatmate_core::{FlatmateError, Namespace};

use crate::identity::ConversationId;
use crate::model::{ChatStatus, ChatStatusSummary, DEFAULT_LOCATION};
use crate::paths::ChatPaths;
use crate::service::ChatService;

impl ChatService {
    /// Report whether `initiator` already talks to `counterpart` about `listing`.
    ///
    /// Probing never creates anything.
    pub async fn status(
        &self,
        ns: &Namespace,
        initiator: &str,
        counterpart: &str,
        listing: &str,
    ) -> Result<ChatStatus, FlatmateError> {
        let chat = ConversationId::new(initiator, counterpart, listing)?;
        let path = ChatPaths::new(ns, &chat).metadata()?;
        let Some(doc) = ns.store().get(&path).await? else {
            return Ok(ChatStatus::Missing {
                suggested_chat_id: chat.to_string(),
            });
        };

        let last = doc.get("lastMessage");
        Ok(ChatStatus::Exists(ChatStatusSummary {
            chat_id: chat.to_string(),
            last_message: last
                .and_then(|m| m.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            last_timestamp: last
                .and_then(|m| m.get("timestamp"))
                .and_then(Value::as_i64)
                .unwrap_or(0),
            property_location: doc
                .get("propertyLocation")
                .and_then(Value::as_str)
                .filter(|l| !l.is_empty())
                .unwrap_or(DEFAULT_LOCATION)
                .to_string(),
        }))
    }
}
