// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender, per-conversation message quota.
//!
//! The counter lives at `chats/{id}/limits/{sender}`. The ledger only reads
//! it; the increment travels inside the same atomic write that stores the
//! message, so a message can never land without being counted.

use serde_json::Value;

use flatmate_core::{FlatmateError, Namespace, StorePath};

use crate::identity::ConversationId;

/// The counter as read before a send.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    /// Where the counter lives.
    pub path: StorePath,
    /// Raw stored value, used as the compare-and-swap guard.
    pub observed: Option<Value>,
    /// Messages already counted.
    pub used: u32,
    /// Messages this send may add.
    pub granted: u32,
}

impl Reservation {
    /// Counter value after the send lands.
    pub fn next_count(&self) -> u32 {
        self.used + self.granted
    }
}

/// Enforces the message ceiling.
#[derive(Debug, Clone, Copy)]
pub struct QuotaLedger {
    limit: u32,
}

impl QuotaLedger {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Messages left after `used`, never negative.
    pub fn remaining(&self, used: u32) -> u32 {
        self.limit.saturating_sub(used)
    }

    /// Read the sender's counter, defaulting to zero.
    pub async fn used(
        &self,
        ns: &Namespace,
        chat: &ConversationId,
        sender: &str,
    ) -> Result<(StorePath, Option<Value>, u32), FlatmateError> {
        let path = ns.at(&["chats", chat.as_str(), "limits", sender])?;
        let observed = ns.store().get(&path).await?;
        let used = observed.as_ref().map(count_of).unwrap_or(0);
        Ok((path, observed, used))
    }

    /// Reserve one slot, or fail with [`FlatmateError::QuotaExceeded`].
    pub async fn check_and_reserve(
        &self,
        ns: &Namespace,
        chat: &ConversationId,
        sender: &str,
    ) -> Result<Reservation, FlatmateError> {
        self.reserve_batch(ns, chat, sender, 1).await
    }

    /// Reserve up to `wanted` slots, granting as many as the ceiling allows.
    ///
    /// Fails only when no slot at all is left.
    pub async fn reserve_batch(
        &self,
        ns: &Namespace,
        chat: &ConversationId,
        sender: &str,
        wanted: u32,
    ) -> Result<Reservation, FlatmateError> {
        let (path, observed, used) = self.used(ns, chat, sender).await?;
        if used >= self.limit {
            return Err(FlatmateError::QuotaExceeded {
                conversation_id: chat.to_string(),
                limit: self.limit,
            });
        }
        Ok(Reservation {
            path,
            observed,
            used,
            granted: wanted.min(self.remaining(used)),
        })
    }
}

/// Interpret a stored counter. Anything unreadable counts as zero.
fn count_of(value: &Value) -> u32 {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}
