// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! All failures are collected; validation does not stop at the first one.

use std::collections::HashSet;

use flatmate_core::path::validate_segment;
use tracing::warn;

use crate::diagnostic::ConfigError;
use crate::model::{FlatmateConfig, StoreBackend};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &FlatmateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut push = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        push("server.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        push(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        ));
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        push(format!(
            "server.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.server.log_level
        ));
    }

    if config.server.max_body_bytes == 0 {
        push("server.max_body_bytes must be greater than zero".to_string());
    }

    if config.chat.message_quota == 0 {
        push("chat.message_quota must be at least 1".to_string());
    }
    if config.chat.max_message_chars == 0 {
        push("chat.max_message_chars must be at least 1".to_string());
    }
    if config.chat.read_limit == 0 {
        push("chat.read_limit must be at least 1".to_string());
    }

    if !is_valid_key(&config.default_tenant) {
        push(format!(
            "default_tenant `{}` is not a valid tenant name",
            config.default_tenant
        ));
    }

    if !config.tenants.is_empty() && config.tenant(&config.default_tenant).is_none() {
        push(format!(
            "default_tenant `{}` has no [[tenants]] section",
            config.default_tenant
        ));
    }

    let mut seen = HashSet::new();
    for tenant in &config.tenants {
        if !is_valid_key(&tenant.name) {
            push(format!("tenant name `{}` is not valid", tenant.name));
        }
        if !seen.insert(tenant.name.as_str()) {
            push(format!("tenant `{}` is declared more than once", tenant.name));
        }
        if let Some(root) = &tenant.root {
            if !root.split('/').all(is_valid_key) {
                push(format!(
                    "tenants.{}.root `{root}` contains an invalid segment",
                    tenant.name
                ));
            }
        }
        if tenant.backend == StoreBackend::Memory {
            warn!(tenant = %tenant.name, "tenant uses the memory backend; its data is lost on exit");
        }
        if tenant.backend == StoreBackend::Sqlite {
            if let Some(path) = &tenant.database_path {
                if path.trim().is_empty() {
                    push(format!(
                        "tenants.{}.database_path must not be empty",
                        tenant.name
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_key(key: &str) -> bool {
    validate_segment(key).is_ok()
}
