// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document store doubles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use flatmate_config::TenantConfig;
use flatmate_core::{DocumentStore, FlatmateError, StorePath};
use flatmate_storage::MemoryStore;
use flatmate_tenant::StoreConnector;

/// In-memory store whose writes can be made to fail on demand.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Writes attempted so far, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), FlatmateError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FlatmateError::storage(std::io::Error::other(
                "injected write failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, FlatmateError> {
        self.inner.get(path).await
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), FlatmateError> {
        self.check()?;
        self.inner.set(path, value).await
    }

    async fn multi_update(&self, updates: Vec<(StorePath, Value)>) -> Result<(), FlatmateError> {
        self.check()?;
        self.inner.multi_update(updates).await
    }

    async fn guarded_update(
        &self,
        guard: &StorePath,
        expected: Option<Value>,
        updates: Vec<(StorePath, Value)>,
    ) -> Result<bool, FlatmateError> {
        self.check()?;
        self.inner.guarded_update(guard, expected, updates).await
    }

    fn push_key(&self) -> String {
        self.inner.push_key()
    }
}

/// Connector handing every tenant the same store.
pub struct SharedStoreConnector {
    store: Arc<dyn DocumentStore>,
}

impl SharedStoreConnector {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreConnector for SharedStoreConnector {
    async fn connect(&self, _tenant: &TenantConfig) -> Result<Arc<dyn DocumentStore>, FlatmateError> {
        Ok(self.store.clone())
    }
}
