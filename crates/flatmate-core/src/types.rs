// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the messaging, notification, and gateway crates.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FlatmateError;
use crate::path::StorePath;
use crate::traits::DocumentStore;

/// Milliseconds since the Unix epoch, the timestamp unit stored in documents.
pub type Millis = i64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> Millis {
    chrono::Utc::now().timestamp_millis()
}

/// A verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Stable user identifier.
    pub uid: String,
    /// Email claim, when the credential carries one.
    #[serde(default)]
    pub email: Option<String>,
}

/// One tenant's isolated slice of a document store.
///
/// All paths built through a namespace are rooted at the tenant's data
/// root, so code written against a `Namespace` can never address another
/// tenant's tree.
#[derive(Clone)]
pub struct Namespace {
    name: String,
    root: StorePath,
    store: Arc<dyn DocumentStore>,
}

impl Namespace {
    pub fn new(name: impl Into<String>, root: StorePath, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            name: name.into(),
            root,
            store,
        }
    }

    /// Tenant name this namespace was resolved for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tenant's data root.
    pub fn root(&self) -> &StorePath {
        &self.root
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Build a path below the root from individually validated segments.
    ///
    /// Each element must be a single segment; ids received from clients go
    /// through here so they cannot smuggle in extra path levels.
    pub fn at(&self, segments: &[&str]) -> Result<StorePath, FlatmateError> {
        let mut path = self.root.clone();
        for segment in segments {
            path.push(segment)?;
        }
        Ok(path)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("root", &self.root.to_string())
            .finish()
    }
}
