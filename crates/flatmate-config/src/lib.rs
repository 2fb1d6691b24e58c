// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Flatmate messaging backend.
//!
//! A `flatmate.toml` (system, user, then working directory) is layered over
//! compiled defaults, `FLATMATE_*` variables override it, and the result is
//! checked before anything starts. Every problem found is reported, each as
//! a miette diagnostic.
//!
//! ```no_run
//! match flatmate_config::load_and_validate() {
//!     Ok(config) => println!("default tenant: {}", config.default_tenant),
//!     Err(errors) => flatmate_config::render_errors(&errors),
//! }
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{ChatConfig, FlatmateConfig, ServerConfig, StoreBackend, TenantConfig};

/// Load from the standard file hierarchy and environment, then validate.
pub fn load_and_validate() -> Result<FlatmateConfig, Vec<ConfigError>> {
    checked(loader::load_config(), || read_sources(standard_files()))
}

/// Load from one explicit file and the environment, then validate.
pub fn load_and_validate_path(path: &Path) -> Result<FlatmateConfig, Vec<ConfigError>> {
    checked(
        loader::load_config_from_path(path),
        || read_sources(vec![path.to_path_buf()]),
    )
}

/// Load from TOML text alone, then validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<FlatmateConfig, Vec<ConfigError>> {
    checked(
        loader::load_config_from_str(toml_content),
        || vec![("<inline>".to_string(), toml_content.to_string())],
    )
}

fn checked(
    loaded: Result<FlatmateConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<FlatmateConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn standard_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(loader::SYSTEM_CONFIG)];
    files.extend(dirs::config_dir().map(|dir| dir.join(loader::USER_CONFIG)));
    files.push(PathBuf::from(loader::LOCAL_CONFIG));
    files
}

/// Texts of the files that exist, for pointing diagnostics at a line.
fn read_sources(files: Vec<PathBuf>) -> Vec<(String, String)> {
    files
        .into_iter()
        .filter_map(|path| {
            let text = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), text))
        })
        .collect()
}
