// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant registry: maps an application name to its namespace and verifier.
//!
//! Resolution is lazy and single-flight. The first caller for a name loads
//! credentials and connects the store; callers racing it await the same
//! initialization. A failed initialization is not cached, so the next call
//! tries again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use flatmate_config::{FlatmateConfig, TenantConfig};
use flatmate_core::{DocumentStore, FlatmateError, IdentityVerifier, Namespace, StorePath};

use crate::credentials::{self, EnvLookup};
use crate::session::SessionTokenVerifier;

/// Opens the document store behind a tenant.
#[async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    async fn connect(&self, tenant: &TenantConfig) -> Result<Arc<dyn DocumentStore>, FlatmateError>;
}

/// Connector that opens the backend named in the tenant's config.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfiguredStoreConnector;

#[async_trait]
impl StoreConnector for ConfiguredStoreConnector {
    async fn connect(&self, tenant: &TenantConfig) -> Result<Arc<dyn DocumentStore>, FlatmateError> {
        flatmate_storage::connect(tenant.backend, &tenant.database_path()).await
    }
}

/// Everything a request needs to act inside one tenant.
pub struct TenantHandle {
    namespace: Namespace,
    verifier: Arc<SessionTokenVerifier>,
    cookie_name: String,
    project_id: String,
}

impl TenantHandle {
    pub fn name(&self) -> &str {
        self.namespace.name()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn verifier(&self) -> &dyn IdentityVerifier {
        self.verifier.as_ref()
    }

    /// The concrete verifier, for minting tokens in tooling.
    pub fn sessions(&self) -> &SessionTokenVerifier {
        &self.verifier
    }

    /// Cookie the tenant's session token travels in.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl fmt::Debug for TenantHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantHandle")
            .field("namespace", &self.namespace)
            .field("cookie_name", &self.cookie_name)
            .field("project_id", &self.project_id)
            .finish()
    }
}

type Slot = Arc<OnceCell<Arc<TenantHandle>>>;

/// Process-wide tenant cache, passed to request handlers as shared state.
pub struct TenantRegistry {
    default_tenant: String,
    tenants: HashMap<String, TenantConfig>,
    resolved: DashMap<String, Slot>,
    connector: Arc<dyn StoreConnector>,
    env: EnvLookup,
}

impl TenantRegistry {
    pub fn new(config: &FlatmateConfig) -> Self {
        Self {
            default_tenant: config.default_tenant.clone(),
            tenants: config
                .tenants
                .iter()
                .map(|t| (t.name.clone(), t.clone()))
                .collect(),
            resolved: DashMap::new(),
            connector: Arc::new(ConfiguredStoreConnector),
            env: credentials::process_env(),
        }
    }

    /// Replace the store connector.
    pub fn with_connector(mut self, connector: Arc<dyn StoreConnector>) -> Self {
        self.connector = connector;
        self
    }

    /// Replace the environment lookup used for credential fallbacks.
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub fn default_tenant(&self) -> &str {
        &self.default_tenant
    }

    /// Number of tenants resolved so far.
    pub fn resolved_count(&self) -> usize {
        self.resolved
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    /// Resolve `name` (or the default tenant when `None` or empty).
    pub async fn resolve(&self, name: Option<&str>) -> Result<Arc<TenantHandle>, FlatmateError> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.default_tenant);
        let tenant = self.tenant_config(name)?;

        // Clone the slot out so no map guard is held across the await.
        let slot = Arc::clone(self.resolved.entry(name.to_string()).or_default().value());
        slot.get_or_try_init(|| self.initialize(tenant))
            .await
            .map(Arc::clone)
    }

    /// The config section for `name`. The default tenant may be configured
    /// entirely through the environment, in which case it has no section.
    fn tenant_config(&self, name: &str) -> Result<TenantConfig, FlatmateError> {
        match self.tenants.get(name) {
            Some(tenant) => Ok(tenant.clone()),
            None if name == self.default_tenant => Ok(TenantConfig::named(name)),
            None => Err(FlatmateError::TenantNotFound(name.to_string())),
        }
    }

    async fn initialize(&self, tenant: TenantConfig) -> Result<Arc<TenantHandle>, FlatmateError> {
        let unavailable = |reason: String| FlatmateError::TenantUnavailable {
            name: tenant.name.clone(),
            reason,
        };

        let credentials = credentials::load_credentials(&tenant, &self.env).inspect_err(|e| {
            warn!(tenant = %tenant.name, error = %e, "tenant credentials incomplete");
        })?;
        let root = StorePath::parse(tenant.root()).map_err(|e| unavailable(e.to_string()))?;
        let store = self
            .connector
            .connect(&tenant)
            .await
            .map_err(|e| unavailable(format!("store connection failed: {e}")))?;

        info!(
            tenant = %tenant.name,
            root = %root,
            backend = ?tenant.backend,
            project_id = %credentials.project_id,
            "tenant resolved"
        );

        Ok(Arc::new(TenantHandle {
            namespace: Namespace::new(tenant.name.clone(), root, store),
            verifier: Arc::new(SessionTokenVerifier::new(credentials.session_secret)),
            cookie_name: tenant.cookie_name(),
            project_id: credentials.project_id,
        }))
    }
}

impl fmt::Debug for TenantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantRegistry")
            .field("default_tenant", &self.default_tenant)
            .field("configured", &self.tenants.len())
            .field("resolved", &self.resolved_count())
            .finish()
    }
}
