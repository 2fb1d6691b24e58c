// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` assembles a configuration and a tenant registry whose
//! tenants carry test credentials, so tests can resolve namespaces and mint
//! session tokens without any environment setup.

use std::sync::Arc;
use std::time::Duration;

use flatmate_config::{ChatConfig, FlatmateConfig, StoreBackend, TenantConfig};
use flatmate_core::{DocumentStore, FlatmateError, Namespace};
use flatmate_tenant::{EnvLookup, TenantHandle, TenantRegistry};

use crate::mock_store::SharedStoreConnector;

/// Builder for creating test environments.
pub struct TestHarnessBuilder {
    tenants: Vec<String>,
    chat: ChatConfig,
    sqlite: bool,
    shared_store: Option<Arc<dyn DocumentStore>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            tenants: Vec::new(),
            chat: ChatConfig::default(),
            sqlite: false,
            shared_store: None,
        }
    }

    /// Add a tenant. The first one added is the default.
    pub fn with_tenant(mut self, name: &str) -> Self {
        self.tenants.push(name.to_string());
        self
    }

    pub fn with_chat(mut self, chat: ChatConfig) -> Self {
        self.chat = chat;
        self
    }

    /// Back tenants with SQLite files in a temp directory instead of memory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Give every tenant this store.
    pub fn with_shared_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.shared_store = Some(store);
        self
    }

    pub fn build(self) -> Result<TestHarness, FlatmateError> {
        let temp_dir = tempfile::TempDir::new().map_err(FlatmateError::storage)?;
        let names = if self.tenants.is_empty() {
            vec!["flatmate".to_string()]
        } else {
            self.tenants
        };

        let tenants = names
            .iter()
            .map(|name| {
                let mut tenant = TenantConfig::named(name.as_str());
                if self.sqlite {
                    tenant.backend = StoreBackend::Sqlite;
                    tenant.database_path = Some(
                        temp_dir
                            .path()
                            .join(format!("{name}.db"))
                            .to_string_lossy()
                            .to_string(),
                    );
                } else {
                    tenant.backend = StoreBackend::Memory;
                }
                tenant.project_id = Some(format!("{name}-test"));
                tenant.client_email = Some(format!("service@{name}.test"));
                tenant.session_secret = Some(format!("{name}-test-secret"));
                tenant
            })
            .collect();

        let config = FlatmateConfig {
            default_tenant: names[0].clone(),
            chat: self.chat,
            tenants,
            ..FlatmateConfig::default()
        };

        let no_env: EnvLookup = Arc::new(|_| None);
        let mut registry = TenantRegistry::new(&config).with_env(no_env);
        if let Some(store) = self.shared_store {
            registry = registry.with_connector(Arc::new(SharedStoreConnector::new(store)));
        }

        Ok(TestHarness {
            config,
            registry: Arc::new(registry),
            _temp_dir: temp_dir,
        })
    }
}

/// A configured registry with test tenants.
pub struct TestHarness {
    pub config: FlatmateConfig,
    pub registry: Arc<TenantRegistry>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with one in-memory tenant named `flatmate`.
    pub fn in_memory() -> Result<Self, FlatmateError> {
        Self::builder().build()
    }

    pub async fn tenant(&self, name: Option<&str>) -> Result<Arc<TenantHandle>, FlatmateError> {
        self.registry.resolve(name).await
    }

    pub async fn namespace(&self, name: Option<&str>) -> Result<Namespace, FlatmateError> {
        Ok(self.tenant(name).await?.namespace().clone())
    }

    /// A session token for `uid`, valid for an hour.
    pub async fn token(&self, tenant: Option<&str>, uid: &str) -> Result<String, FlatmateError> {
        self.tenant(tenant)
            .await?
            .sessions()
            .issue(uid, None, Duration::from_secs(3600))
    }

    /// Seed a user profile document.
    pub async fn seed_user(
        &self,
        tenant: Option<&str>,
        uid: &str,
        profile: serde_json::Value,
    ) -> Result<(), FlatmateError> {
        let ns = self.namespace(tenant).await?;
        ns.store().set(&ns.at(&["users", uid])?, profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatmate_core::IdentityVerifier;

    #[tokio::test]
    async fn default_harness_resolves_and_mints_tokens() {
        let harness = TestHarness::in_memory().unwrap();
        let token = harness.token(None, "u1").await.unwrap();
        let tenant = harness.tenant(None).await.unwrap();
        assert_eq!(tenant.name(), "flatmate");
        assert_eq!(tenant.verifier().verify(&token).await.unwrap().uid, "u1");
    }

    #[tokio::test]
    async fn tenants_have_separate_secrets() {
        let harness = TestHarness::builder()
            .with_tenant("flatmate")
            .with_tenant("roomies")
            .build()
            .unwrap();
        let token = harness.token(Some("roomies"), "u1").await.unwrap();
        let flatmate = harness.tenant(Some("flatmate")).await.unwrap();
        assert!(flatmate.verifier().verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn sqlite_harness_persists_documents() {
        let harness = TestHarness::builder().with_sqlite().build().unwrap();
        harness
            .seed_user(None, "u1", serde_json::json!({"name": "Asha"}))
            .await
            .unwrap();
        let ns = harness.namespace(None).await.unwrap();
        let doc = ns.store().get(&ns.at(&["users", "u1", "name"]).unwrap()).await.unwrap();
        assert_eq!(doc, Some(serde_json::json!("Asha")));
    }
}
