// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde_json::Value;
use tracing::{debug, warn};

use flatmate_core::{FlatmateError, Namespace};

use crate::model::{ConversationMetadata, ConversationSummary};
use crate::profile::fetch_profile;
use crate::service::ChatService;

impl ChatService {
    /// List the conversations of `uid`, most recent activity first.
    ///
    /// Index entries whose metadata is missing or names no partner are dropped.
    pub async fn list(
        &self,
        ns: &Namespace,
        uid: &str,
    ) -> Result<Vec<ConversationSummary>, FlatmateError> {
        let index = ns.at(&["users", uid, "myChats"])?;
        let chat_ids: Vec<String> = match ns.store().get(&index).await? {
            Some(Value::Object(map)) => map.into_iter().map(|(id, _)| id).collect(),
            _ => return Ok(Vec::new()),
        };

        let rows = futures::future::try_join_all(
            chat_ids.iter().map(|id| summarize(ns, uid, id)),
        )
        .await?;
        let mut chats: Vec<ConversationSummary> = rows.into_iter().flatten().collect();
        chats.sort_by_key(|c| std::cmp::Reverse(c.last_timestamp()));

        debug!(
            tenant = %ns.name(),
            uid = %uid,
            indexed = chat_ids.len(),
            listed = chats.len(),
            "conversations listed"
        );
        Ok(chats)
    }
}

async fn summarize(
    ns: &Namespace,
    uid: &str,
    chat_id: &str,
) -> Result<Option<ConversationSummary>, FlatmateError> {
    let path = ns.at(&["chats", chat_id, "metadata"])?;
    let Some(doc) = ns.store().get(&path).await? else {
        return Ok(None);
    };
    let mut metadata = match serde_json::from_value::<ConversationMetadata>(doc) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(chat_id = %chat_id, error = %e, "skipping unreadable conversation metadata");
            return Ok(None);
        }
    };
    let Some(partner) = metadata
        .participants
        .iter()
        .find(|p| !p.trim().is_empty() && p.as_str() != uid)
        .cloned()
    else {
        return Ok(None);
    };
    if metadata.chat_id.is_empty() {
        metadata.chat_id = chat_id.to_string();
    }

    let profile = match fetch_profile(ns, &partner).await {
        Ok(profile) => profile.unwrap_or_default(),
        Err(FlatmateError::Validation(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(Some(ConversationSummary {
        metadata,
        partner_name: profile.display_name_or_default(),
        partner_photo: profile.photo_url,
        partner_phone: profile.phone_number,
        partner_id: partner,
    }))
}
