// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Flatmate configuration system.

use flatmate_config::diagnostic::ConfigError;
use flatmate_config::{load_and_validate_path, load_and_validate_str, load_config_from_str, StoreBackend};

/// A full file with every section deserializes.
#[test]
fn valid_toml_deserializes_into_flatmate_config() {
    let toml = r#"
default_tenant = "roomies"

[server]
host = "0.0.0.0"
port = 3000
log_level = "debug"
max_body_bytes = 1024

[chat]
message_quota = 3
max_message_chars = 200
read_limit = 50
strict_quota = true

[[tenants]]
name = "roomies"
backend = "memory"
session_secret = "s3cret"

[[tenants]]
name = "flatmate"
root = "flatmate-prod"
database_path = "/tmp/flatmate.db"
cookie_name = "fm_session"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.default_tenant, "roomies");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.max_body_bytes, 1024);
    assert_eq!(config.chat.message_quota, 3);
    assert_eq!(config.chat.read_limit, 50);
    assert!(config.chat.strict_quota);
    assert_eq!(config.tenants.len(), 2);

    let roomies = config.tenant("roomies").unwrap();
    assert_eq!(roomies.backend, StoreBackend::Memory);
    assert_eq!(roomies.root(), "roomies");
    assert_eq!(roomies.session_secret.as_deref(), Some("s3cret"));

    let flatmate = config.tenant("flatmate").unwrap();
    assert_eq!(flatmate.root(), "flatmate-prod");
    assert_eq!(flatmate.cookie_name(), "fm_session");
    assert_eq!(flatmate.database_path(), "/tmp/flatmate.db");
}

/// An empty file yields the defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.default_tenant, "flatmate");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.chat.message_quota, 5);
}

/// A misspelt key is rejected with a suggestion.
#[test]
fn unknown_key_in_chat_suggests_correction() {
    let toml = "[chat]\nmessage_qouta = 5\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "message_qouta");
            assert_eq!(suggestion.as_deref(), Some("message_quota"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown keys inside a tenant section are rejected too.
#[test]
fn unknown_key_in_tenant_is_rejected() {
    let toml = "[[tenants]]\nname = \"a\"\nprojct_id = \"p\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(&errors[0], ConfigError::UnknownKey { key, .. } if key == "projct_id"));
}

/// Wrong value types surface as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = "[server]\nport = \"eighty\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(&errors[0], ConfigError::InvalidType { .. }));
}

/// Semantic validation runs after a successful parse.
#[test]
fn semantic_validation_errors_are_returned() {
    let toml = "[chat]\nread_limit = 0\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("read_limit")));
}

/// A tenant section without a name is a missing key.
#[test]
fn tenant_without_name_is_missing_key() {
    let toml = "[[tenants]]\nbackend = \"memory\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(&errors[0], ConfigError::MissingKey { key, .. } if key == "name"));
}

/// Explicit file paths are loaded and validated.
#[test]
fn loads_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flatmate.toml");
    std::fs::write(&path, "[server]\nport = 4321\n").unwrap();
    let config = load_and_validate_path(&path).unwrap();
    assert_eq!(config.server.port, 4321);
}
