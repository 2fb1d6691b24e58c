// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant identity material.
//!
//! Each field comes from the tenant's config section when set there, and
//! otherwise from `FLATMATE_<NAME>_<FIELD>`.

use std::fmt;
use std::sync::Arc;

use secrecy::SecretString;

use flatmate_config::TenantConfig;
use flatmate_core::FlatmateError;

/// Environment lookup, injectable so tests never touch the process env.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Lookup backed by the process environment.
pub fn process_env() -> EnvLookup {
    Arc::new(|key| std::env::var(key).ok())
}

/// The credential set a tenant authenticates with.
#[derive(Clone)]
pub struct TenantCredentials {
    pub project_id: String,
    pub client_email: String,
    pub session_secret: SecretString,
}

impl fmt::Debug for TenantCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("session_secret", &"[redacted]")
            .finish()
    }
}

/// Name of the env variable holding `field` for `tenant`.
pub fn env_key(tenant: &str, field: &str) -> String {
    format!(
        "FLATMATE_{}_{}",
        tenant.to_ascii_uppercase().replace('-', "_"),
        field.to_ascii_uppercase()
    )
}

/// Gather every identity field for `tenant`.
///
/// Any missing or blank field makes the tenant unusable; the error names
/// all of them at once.
pub fn load_credentials(
    tenant: &TenantConfig,
    env: &EnvLookup,
) -> Result<TenantCredentials, FlatmateError> {
    let lookup = |configured: &Option<String>, field: &str| {
        configured
            .clone()
            .or_else(|| env(&env_key(&tenant.name, field)))
            .filter(|v| !v.trim().is_empty())
    };

    let project_id = lookup(&tenant.project_id, "project_id");
    let client_email = lookup(&tenant.client_email, "client_email");
    let session_secret = lookup(&tenant.session_secret, "session_secret");

    match (project_id, client_email, session_secret) {
        (Some(project_id), Some(client_email), Some(secret)) => Ok(TenantCredentials {
            project_id,
            client_email,
            session_secret: SecretString::from(secret),
        }),
        (project_id, client_email, secret) => {
            let missing: Vec<&str> = [
                ("project_id", project_id.is_none()),
                ("client_email", client_email.is_none()),
                ("session_secret", secret.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();
            Err(FlatmateError::TenantUnavailable {
                name: tenant.name.clone(),
                reason: format!("missing credential fields: {}", missing.join(", ")),
            })
        }
    }
}
