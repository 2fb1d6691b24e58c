// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Flatmate messaging backend.

use thiserror::Error;

/// The primary error type used across all Flatmate crates.
///
/// Variants fall into the four classes callers care about: validation and
/// authorization failures (terminal, no side effects), quota rejection
/// (terminal, distinguishable), and infrastructure failures (opaque to
/// clients, logged server-side).
#[derive(Debug, Error)]
pub enum FlatmateError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Document store errors (connection failure, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Request validation failed before any write was attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// Both participants of a conversation are the same identity.
    #[error("a conversation needs two distinct participants")]
    SelfConversation,

    /// The caller is authenticated but not allowed to touch the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The sender has used up their message quota for this conversation.
    #[error("message limit of {limit} reached in conversation {conversation_id}")]
    QuotaExceeded {
        conversation_id: String,
        limit: u32,
    },

    /// No valid credential was presented.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The requested tenant is not configured.
    #[error("unknown tenant `{0}`")]
    TenantNotFound(String),

    /// The tenant is configured but cannot authenticate or connect.
    #[error("tenant `{name}` unavailable: {reason}")]
    TenantUnavailable { name: String, reason: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlatmateError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Returns true for failures the caller caused (4xx class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::SelfConversation
                | Self::Forbidden(_)
                | Self::QuotaExceeded { .. }
                | Self::Unauthenticated(_)
                | Self::TenantNotFound(_)
        )
    }
}

impl From<serde_json::Error> for FlatmateError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err)
    }
}
