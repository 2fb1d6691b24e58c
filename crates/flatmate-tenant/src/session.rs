// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-signed session tokens.
//!
//! A token is `base64url(claims JSON) "." hex(HMAC-SHA256(payload))`, keyed
//! with the tenant's session secret. Issuing tokens belongs to the login
//! flow, which lives elsewhere; [`SessionTokenVerifier::issue`] exists for
//! tooling and tests.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use flatmate_core::{Caller, FlatmateError, IdentityVerifier};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// Expiry, seconds since the Unix epoch.
    exp: i64,
}

/// Verifies (and can mint) one tenant's session tokens.
pub struct SessionTokenVerifier {
    secret: SecretString,
}

impl SessionTokenVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, FlatmateError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| FlatmateError::Internal(format!("invalid session secret: {e}")))
    }

    /// Mint a token for `uid` valid for `ttl`.
    pub fn issue(
        &self,
        uid: &str,
        email: Option<&str>,
        ttl: Duration,
    ) -> Result<String, FlatmateError> {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            uid: uid.to_string(),
            email: email.map(str::to_string),
            exp: chrono::Utc::now().timestamp().saturating_add(ttl),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }
}

#[async_trait]
impl IdentityVerifier for SessionTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<Caller, FlatmateError> {
        let invalid = || FlatmateError::Unauthenticated("invalid session token".to_string());

        let (payload, signature) = credential.trim().split_once('.').ok_or_else(invalid)?;
        let signature = hex::decode(signature).map_err(|_| invalid())?;
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(FlatmateError::Unauthenticated(
                "session expired".to_string(),
            ));
        }
        if claims.uid.is_empty() {
            return Err(invalid());
        }

        Ok(Caller {
            uid: claims.uid,
            email: claims.email,
        })
    }
}
