// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The messaging service.
//!
//! Operations take the caller's [`Namespace`](flatmate_core::Namespace)
//! explicitly; the service itself holds only limits and is shared by every
//! tenant.

use flatmate_config::ChatConfig;

use crate::quota::QuotaLedger;

/// Guarded sends retry this many times when the counter moves underneath them.
pub(crate) const CAS_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct ChatService {
    pub(crate) config: ChatConfig,
    pub(crate) ledger: QuotaLedger,
}

impl ChatService {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            ledger: QuotaLedger::new(config.message_quota),
            config,
        }
    }

    pub fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

impl Default for ChatService {
    fn default() -> Self {
        Self::new(ChatConfig::default())
    }
}
