// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation identifiers.
//!
//! A conversation is named by its two participants, sorted, and the listing
//! they are talking about: `"{low}_{high}_{listing}"`. The id is a pure
//! function of the unordered pair plus the listing, so either side can
//! compute it without a lookup.

use std::fmt;

use serde::{Serialize, Serializer};

use flatmate_core::path::validate_segment;
use flatmate_core::FlatmateError;

const SEPARATOR: char = '_';

/// A validated conversation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId {
    raw: String,
    /// Byte offsets of the two separators after the participant ids.
    first: usize,
    second: usize,
}

impl ConversationId {
    /// Derive the id for a conversation between `a` and `b` about `listing`.
    ///
    /// Fails with [`FlatmateError::SelfConversation`] when both ids are equal.
    pub fn new(a: &str, b: &str, listing: &str) -> Result<Self, FlatmateError> {
        let a = participant(a)?;
        let b = participant(b)?;
        let listing = listing.trim();
        if listing.is_empty() {
            return Err(FlatmateError::Validation("missing listing id".to_string()));
        }
        validate_segment(listing)?;
        if a == b {
            return Err(FlatmateError::SelfConversation);
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self {
            raw: format!("{low}{SEPARATOR}{high}{SEPARATOR}{listing}"),
            first: low.len(),
            second: low.len() + 1 + high.len(),
        })
    }

    /// Parse an id received from a client.
    pub fn parse(raw: &str) -> Result<Self, FlatmateError> {
        validate_segment(raw)?;
        let malformed = || FlatmateError::Validation(format!("malformed conversation id `{raw}`"));
        let mut parts = raw.splitn(3, SEPARATOR);
        let (Some(a), Some(b), Some(listing)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        if a.is_empty() || b.is_empty() || listing.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            raw: raw.to_string(),
            first: a.len(),
            second: a.len() + 1 + b.len(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The two participant ids in id order.
    pub fn participants(&self) -> (&str, &str) {
        (&self.raw[..self.first], &self.raw[self.first + 1..self.second])
    }

    pub fn listing(&self) -> &str {
        &self.raw[self.second + 1..]
    }

    pub fn has_participant(&self, uid: &str) -> bool {
        let (a, b) = self.participants();
        a == uid || b == uid
    }

    /// The participant who is not `uid`, or `None` if `uid` is not in the conversation.
    pub fn other_participant(&self, uid: &str) -> Option<&str> {
        match self.participants() {
            (a, b) if a == uid => Some(b),
            (a, b) if b == uid => Some(a),
            _ => None,
        }
    }
}

fn participant(id: &str) -> Result<&str, FlatmateError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(FlatmateError::Validation(
            "missing participant id".to_string(),
        ));
    }
    validate_segment(id)?;
    if id.contains(SEPARATOR) {
        return Err(FlatmateError::Validation(format!(
            "participant id `{id}` must not contain `{SEPARATOR}`"
        )));
    }
    Ok(id)
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ConversationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
