// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics rendered through miette.
//!
//! Figment reports every problem it finds in one error chain. Each link is
//! turned into a [`ConfigError`]; unknown keys are located in the TOML text
//! they came from and get a spelling suggestion when one is close enough.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {}", section_label(section.as_deref()))]
    #[diagnostic(
        code(flatmate::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        section: Option<String>,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(flatmate::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    #[error("missing key `{key}` in {}", section_label(section.as_deref()))]
    #[diagnostic(code(flatmate::config::missing_key), help("{}", missing_key_help(key, section.as_deref())))]
    MissingKey { key: String, section: Option<String> },

    /// A semantic check failed after deserialization.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(flatmate::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(flatmate::config::other))]
    Other(String),
}

fn section_label(section: Option<&str>) -> String {
    match section {
        Some("tenants") => "a [[tenants]] entry".to_string(),
        Some(name) => format!("[{name}]"),
        None => "the top level".to_string(),
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Keys allowed here: {valid_keys}"),
        None => format!("keys allowed here: {valid_keys}"),
    }
}

fn missing_key_help(key: &str, section: Option<&str>) -> String {
    match section {
        Some("tenants") => format!("every [[tenants]] entry needs `{key} = ...`"),
        _ => format!("add `{key} = ...` to flatmate.toml"),
    }
}

/// TOML texts the configuration was read from, by display path.
pub struct TomlSources<'a>(pub &'a [(String, String)]);

impl TomlSources<'_> {
    /// The text an error came from. Inline strings carry no file name, so
    /// they match only when a single source was supplied.
    fn origin_of(&self, error: &figment::Error) -> Option<&(String, String)> {
        let file = error
            .metadata
            .as_ref()
            .and_then(|m| m.source.as_ref())
            .and_then(|source| match source {
                figment::Source::File(path) => Some(path.display().to_string()),
                _ => None,
            });
        match file {
            Some(file) => self.0.iter().find(|(path, _)| *path == file),
            None if self.0.len() == 1 => self.0.first(),
            None => None,
        }
    }

    fn locate(
        &self,
        error: &figment::Error,
        section: Option<&str>,
        key: &str,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        let Some((path, text)) = self.origin_of(error) else {
            return (None, None);
        };
        match find_key_offset(text, section, key) {
            Some(offset) => (
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(path, text.clone())),
            ),
            None => (None, None),
        }
    }
}

/// Convert a `figment::Error` chain into diagnostics, one per failure.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    let sources = TomlSources(toml_sources);
    err.into_iter().map(|error| diagnose(error, &sources)).collect()
}

fn diagnose(error: figment::Error, sources: &TomlSources<'_>) -> ConfigError {
    let section = error.path.first().cloned();
    match &error.kind {
        Kind::UnknownField(key, allowed) => {
            let (span, src) = sources.locate(&error, section.as_deref(), key);
            ConfigError::UnknownKey {
                key: key.clone(),
                suggestion: suggest_key(key, allowed),
                valid_keys: allowed.join(", "),
                section,
                span,
                src,
            }
        }
        Kind::MissingField(key) => ConfigError::MissingKey {
            key: key.to_string(),
            section,
        },
        Kind::InvalidType(found, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            found: found.to_string(),
            expected: expected.clone(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Byte offset of the first `key = ...` line inside `section`.
///
/// `section` matches both `[name]` and `[[name]]` headers; `None` means the
/// top level, before any header.
pub fn find_key_offset(text: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            current = Some(trimmed.trim_end().trim_matches(|c| c == '[' || c == ']').trim());
        } else if current == section {
            let indent = line.len() - trimmed.len();
            if let Some(rest) = trimmed.strip_prefix(key) {
                if rest.trim_start().starts_with('=') {
                    return Some(offset + indent);
                }
            }
        }
        offset += line.len();
    }
    None
}

/// The allowed key closest to `unknown`, if any is close enough.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, allowed: &[S]) -> Option<String> {
    allowed
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key.as_ref()), key.as_ref()))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
