// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store addresses of one conversation's records.
//!
//! ```text
//! {root}/messages/{chat}/bucket_{n}/messages/{key}   message records
//! {root}/messages/{chat}/bucket_{n}/bucketId         bucket self-description
//! {root}/messages/{chat}/bucket_{n}/chatId
//! {root}/chats/{chat}/metadata                       denormalized summary
//! {root}/chats/{chat}/lastSeen/{uid}
//! {root}/chats/{chat}/limits/{uid}                   quota counter
//! {root}/users/{uid}/myChats/{chat}                  user -> conversation index
//! ```

use flatmate_core::{FlatmateError, Namespace, StorePath};

use crate::identity::ConversationId;

/// Messages currently go to bucket 1; rollover is not implemented.
pub const CURRENT_BUCKET: u32 = 1;

pub struct ChatPaths<'a> {
    ns: &'a Namespace,
    chat: &'a ConversationId,
}

impl<'a> ChatPaths<'a> {
    pub fn new(ns: &'a Namespace, chat: &'a ConversationId) -> Self {
        Self { ns, chat }
    }

    pub fn bucket(&self, bucket: u32) -> Result<StorePath, FlatmateError> {
        self.ns
            .at(&["messages", self.chat.as_str(), &format!("bucket_{bucket}")])
    }

    pub fn messages(&self, bucket: u32) -> Result<StorePath, FlatmateError> {
        self.bucket(bucket)?.child("messages")
    }

    pub fn message(&self, bucket: u32, key: &str) -> Result<StorePath, FlatmateError> {
        self.messages(bucket)?.child(key)
    }

    pub fn metadata(&self) -> Result<StorePath, FlatmateError> {
        self.ns.at(&["chats", self.chat.as_str(), "metadata"])
    }

    pub fn last_seen(&self, uid: &str) -> Result<StorePath, FlatmateError> {
        self.ns.at(&["chats", self.chat.as_str(), "lastSeen", uid])
    }

    pub fn user_index(&self, uid: &str) -> Result<StorePath, FlatmateError> {
        self.ns.at(&["users", uid, "myChats", self.chat.as_str()])
    }
}
