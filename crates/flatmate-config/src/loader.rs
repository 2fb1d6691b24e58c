// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `/etc/flatmate/flatmate.toml`, then `~/.config/flatmate/flatmate.toml`,
//! then `./flatmate.toml`, then `FLATMATE_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FlatmateConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/flatmate/flatmate.toml";
/// Per-user config file, relative to the XDG config dir.
pub const USER_CONFIG: &str = "flatmate/flatmate.toml";
/// Working-directory config file.
pub const LOCAL_CONFIG: &str = "flatmate.toml";

/// Env keys (prefix stripped, lowercased) that map onto config sections.
const ENV_SECTIONS: [&str; 2] = ["server_", "chat_"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
pub fn load_config() -> Result<FlatmateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<FlatmateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlatmateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FlatmateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlatmateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FlatmateConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join(USER_CONFIG))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// `FLATMATE_SERVER_MAX_BODY_BYTES` must become `server.max_body_bytes`, so
/// only the first underscore after a known section name is turned into a
/// dot. Per-tenant credential variables (`FLATMATE_<TENANT>_*`) are read by
/// the tenant registry at resolve time and are filtered out here.
fn env_provider() -> Env {
    Env::prefixed("FLATMATE_")
        .filter(|key| {
            let key = key.as_str().to_ascii_lowercase();
            key == "default_tenant" || ENV_SECTIONS.iter().any(|s| key.starts_with(s))
        })
        .map(|key| {
            let mut mapped = key.as_str().to_ascii_lowercase();
            for section in ENV_SECTIONS {
                if mapped.starts_with(section) {
                    mapped = mapped.replacen(section, &section.replace('_', "."), 1);
                    break;
                }
            }
            mapped.into()
        })
}
