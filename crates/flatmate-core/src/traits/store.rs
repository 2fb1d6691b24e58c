// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical document store trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FlatmateError;
use crate::path::StorePath;

/// A remote tree-structured key-value store.
///
/// Values are JSON documents addressed by [`StorePath`]. Writing a node
/// replaces its whole subtree; writing `null` deletes it. The one
/// primitive that correctness depends on is [`multi_update`], which writes
/// any number of non-overlapping paths as a single indivisible unit.
///
/// [`multi_update`]: DocumentStore::multi_update
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Read the subtree at `path`, or `None` if nothing is stored there.
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, FlatmateError>;

    /// Replace the subtree at `path` with `value` (`null` deletes).
    async fn set(&self, path: &StorePath, value: Value) -> Result<(), FlatmateError>;

    /// Atomically replace several subtrees. Either every path is written or none is.
    ///
    /// Paths must not overlap (no path may be an ancestor of another).
    async fn multi_update(&self, updates: Vec<(StorePath, Value)>) -> Result<(), FlatmateError>;

    /// Like [`multi_update`](DocumentStore::multi_update), but only applied if the
    /// current value at `guard` equals `expected` (`None` = absent).
    ///
    /// Returns `Ok(false)` without writing anything when the guard does not hold.
    async fn guarded_update(
        &self,
        guard: &StorePath,
        expected: Option<Value>,
        updates: Vec<(StorePath, Value)>,
    ) -> Result<bool, FlatmateError>;

    /// Generate a fresh child key. Keys sort in creation order.
    fn push_key(&self) -> String;

    /// Merge `children` (relative paths) into the node at `base` atomically.
    async fn update_children(
        &self,
        base: &StorePath,
        children: Vec<(String, Value)>,
    ) -> Result<(), FlatmateError> {
        let mut updates = Vec::with_capacity(children.len());
        for (relative, value) in children {
            updates.push((base.join(&relative)?, value));
        }
        self.multi_update(updates).await
    }

    /// Read the last `limit` children of `path` in key order.
    async fn limit_to_last(
        &self,
        path: &StorePath,
        limit: usize,
    ) -> Result<Vec<(String, Value)>, FlatmateError> {
        let children = match self.get(path).await? {
            Some(Value::Object(map)) => map.into_iter().collect::<Vec<_>>(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Vec::new(),
        };
        let skip = children.len().saturating_sub(limit);
        Ok(children.into_iter().skip(skip).collect())
    }
}
