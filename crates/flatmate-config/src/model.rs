// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlatmateConfig {
    /// Tenant used when a request names none.
    #[serde(default = "default_tenant_name")]
    pub default_tenant: String,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Messaging limits.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Tenant applications served by this process.
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

impl Default for FlatmateConfig {
    fn default() -> Self {
        Self {
            default_tenant: default_tenant_name(),
            server: ServerConfig::default(),
            chat: ChatConfig::default(),
            tenants: Vec::new(),
        }
    }
}

impl FlatmateConfig {
    /// Look up a tenant section by name.
    pub fn tenant(&self, name: &str) -> Option<&TenantConfig> {
        self.tenants.iter().find(|t| t.name == name)
    }
}

fn default_tenant_name() -> String {
    "flatmate".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Messaging limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Messages one sender may post into one conversation.
    #[serde(default = "default_message_quota")]
    pub message_quota: u32,

    /// Maximum message length in characters, after markup stripping.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Messages returned by one conversation read.
    #[serde(default = "default_read_limit")]
    pub read_limit: usize,

    /// Guard the quota counter with compare-and-swap instead of the
    /// plain read-then-write, closing the concurrent double-send overshoot.
    #[serde(default)]
    pub strict_quota: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_quota: default_message_quota(),
            max_message_chars: default_max_message_chars(),
            read_limit: default_read_limit(),
            strict_quota: false,
        }
    }
}

fn default_message_quota() -> u32 {
    5
}

fn default_max_message_chars() -> usize {
    500
}

fn default_read_limit() -> usize {
    100
}

/// Which document store implementation backs a tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite file on local disk.
    #[default]
    Sqlite,
    /// Process-local tree; contents are lost on exit.
    Memory,
}

/// One tenant application.
///
/// Identity fields (`project_id`, `client_email`, `session_secret`) may be
/// left out here and supplied through `FLATMATE_<NAME>_*` variables instead;
/// they are only checked when the tenant is first resolved.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    /// Short name clients select with `appName`.
    pub name: String,

    /// Data root inside the store. Defaults to the tenant name.
    #[serde(default)]
    pub root: Option<String>,

    /// Store implementation.
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite database file. Defaults to `<data_dir>/flatmate/<name>.db`.
    #[serde(default)]
    pub database_path: Option<String>,

    /// Project identifier of the tenant's credential set.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Service account email of the tenant's credential set.
    #[serde(default)]
    pub client_email: Option<String>,

    /// HMAC key session tokens are signed with.
    #[serde(default)]
    pub session_secret: Option<String>,

    /// Session cookie name. Defaults to `<name>_session`.
    #[serde(default)]
    pub cookie_name: Option<String>,
}

impl TenantConfig {
    /// A tenant section with only a name; every other field takes its default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: None,
            backend: StoreBackend::default(),
            database_path: None,
            project_id: None,
            client_email: None,
            session_secret: None,
            cookie_name: None,
        }
    }

    /// Effective data root.
    pub fn root(&self) -> &str {
        self.root.as_deref().unwrap_or(&self.name)
    }

    /// Effective session cookie name.
    pub fn cookie_name(&self) -> String {
        self.cookie_name
            .clone()
            .unwrap_or_else(|| format!("{}_session", self.name))
    }

    /// Effective SQLite database path.
    pub fn database_path(&self) -> String {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|p| p.join("flatmate").join(format!("{}.db", self.name)))
                .unwrap_or_else(|| std::path::PathBuf::from(format!("{}.db", self.name)))
                .display()
                .to_string()
        })
    }
}

impl fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantConfig")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("backend", &self.backend)
            .field("database_path", &self.database_path)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field(
                "session_secret",
                &self.session_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("cookie_name", &self.cookie_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_messaging_limits() {
        let config = FlatmateConfig::default();
        assert_eq!(config.default_tenant, "flatmate");
        assert_eq!(config.chat.message_quota, 5);
        assert_eq!(config.chat.max_message_chars, 500);
        assert_eq!(config.chat.read_limit, 100);
        assert!(!config.chat.strict_quota);
        assert!(config.tenants.is_empty());
    }

    #[test]
    fn tenant_defaults_derive_from_name() {
        let tenant = TenantConfig::named("roomies");
        assert_eq!(tenant.root(), "roomies");
        assert_eq!(tenant.cookie_name(), "roomies_session");
        assert_eq!(tenant.backend, StoreBackend::Sqlite);
        assert!(tenant.database_path().ends_with("roomies.db"));
    }

    #[test]
    fn tenant_debug_redacts_secret() {
        let mut tenant = TenantConfig::named("flatmate");
        tenant.session_secret = Some("hunter2".to_string());
        let debug = format!("{tenant:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn backend_deserializes_lowercase() {
        let tenant: TenantConfig = toml::from_str("name = \"t\"\nbackend = \"memory\"").unwrap();
        assert_eq!(tenant.backend, StoreBackend::Memory);
    }
}
