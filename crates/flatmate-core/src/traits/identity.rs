// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity verification trait for request credentials.

use async_trait::async_trait;

use crate::error::FlatmateError;
use crate::types::Caller;

/// Verifies a request credential and yields a stable caller identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    /// Verify the raw credential (cookie value or bearer token).
    ///
    /// Returns [`FlatmateError::Unauthenticated`] for malformed, forged, or
    /// expired credentials.
    async fn verify(&self, credential: &str) -> Result<Caller, FlatmateError>;
}
