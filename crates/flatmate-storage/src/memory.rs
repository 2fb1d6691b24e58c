// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local document store.
//!
//! Every operation takes the tree lock once, so multi-path and guarded
//! writes are atomic with respect to every other call on the same store.

use std::collections::BTreeMap;
use std::convert::Infallible;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use flatmate_core::{DocumentStore, FlatmateError, StorePath};

use crate::push_id::PushIdGenerator;
use crate::tree::{self, LeafTable};

/// In-memory [`DocumentStore`]. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    leaves: RwLock<BTreeMap<String, String>>,
    ids: PushIdGenerator,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored scalars.
    pub async fn leaf_count(&self) -> usize {
        self.leaves.read().await.len()
    }
}

impl LeafTable for BTreeMap<String, String> {
    type Error = Infallible;

    fn read_subtree(&self, key: &str) -> Result<Vec<(String, String)>, Infallible> {
        if key.is_empty() {
            return Ok(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        }
        let (lo, hi) = tree::descendant_range(key);
        let mut rows: Vec<(String, String)> = self
            .get_key_value(key)
            .map(|(k, v)| (k.clone(), v.clone()))
            .into_iter()
            .collect();
        rows.extend(self.range(lo..hi).map(|(k, v)| (k.clone(), v.clone())));
        Ok(rows)
    }

    fn delete_subtree(&mut self, key: &str) -> Result<(), Infallible> {
        if key.is_empty() {
            self.clear();
            return Ok(());
        }
        let (lo, hi) = tree::descendant_range(key);
        let doomed: Vec<String> = self.range(lo..hi).map(|(k, _)| k.clone()).collect();
        for k in doomed {
            self.remove(&k);
        }
        self.remove(key);
        Ok(())
    }

    fn delete_leaf(&mut self, key: &str) -> Result<(), Infallible> {
        self.remove(key);
        Ok(())
    }

    fn insert_leaf(&mut self, key: &str, json: &str) -> Result<(), Infallible> {
        self.insert(key.to_string(), json.to_string());
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, FlatmateError> {
        let leaves = self.leaves.read().await;
        let Ok(document) = tree::read(&*leaves, path);
        Ok(document?)
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), FlatmateError> {
        self.multi_update(vec![(path.clone(), value)]).await
    }

    async fn multi_update(&self, updates: Vec<(StorePath, Value)>) -> Result<(), FlatmateError> {
        let prepared = tree::prepare(updates)?;
        let mut leaves = self.leaves.write().await;
        let Ok(()) = tree::apply_all(&mut *leaves, &prepared);
        Ok(())
    }

    async fn guarded_update(
        &self,
        guard: &StorePath,
        expected: Option<Value>,
        updates: Vec<(StorePath, Value)>,
    ) -> Result<bool, FlatmateError> {
        let prepared = tree::prepare(updates)?;
        let mut leaves = self.leaves.write().await;
        let Ok(holds) = tree::guard_holds(&*leaves, guard, &expected);
        if !holds? {
            return Ok(false);
        }
        let Ok(()) = tree::apply_all(&mut *leaves, &prepared);
        Ok(true)
    }

    fn push_key(&self) -> String {
        self.ids.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn set_get_and_delete() {
        let store = MemoryStore::new();
        store.set(&p("t/users/u1/name"), json!("Ann")).await.unwrap();
        assert_eq!(
            store.get(&p("t/users/u1")).await.unwrap(),
            Some(json!({"name": "Ann"}))
        );
        store.set(&p("t/users/u1"), Value::Null).await.unwrap();
        assert_eq!(store.get(&p("t/users")).await.unwrap(), None);
        assert_eq!(store.leaf_count().await, 0);
    }

    #[tokio::test]
    async fn multi_update_is_all_or_nothing_on_validation() {
        let store = MemoryStore::new();
        let result = store
            .multi_update(vec![
                (p("t/a"), json!(1)),
                (p("t/b"), json!({"bad$key": 1})),
            ])
            .await;
        assert!(matches!(result, Err(FlatmateError::Validation(_))));
        assert_eq!(store.get(&p("t/a")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn guarded_update_checks_current_value() {
        let store = MemoryStore::new();
        let guard = p("t/limits/u1");
        assert!(store
            .guarded_update(&guard, None, vec![(guard.clone(), json!(1))])
            .await
            .unwrap());
        assert!(!store
            .guarded_update(&guard, None, vec![(guard.clone(), json!(2))])
            .await
            .unwrap());
        assert!(store
            .guarded_update(&guard, Some(json!(1)), vec![(guard.clone(), json!(2))])
            .await
            .unwrap());
        assert_eq!(store.get(&guard).await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn limit_to_last_returns_tail_in_key_order() {
        let store = MemoryStore::new();
        let base = p("t/messages");
        let mut keys = Vec::new();
        for i in 0..5 {
            let key = store.push_key();
            store.set(&base.child(&key).unwrap(), json!({"n": i})).await.unwrap();
            keys.push(key);
        }
        let tail = store.limit_to_last(&base, 2).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].0, keys[3]);
        assert_eq!(tail[1].1, json!({"n": 4}));
    }

    #[tokio::test]
    async fn update_children_merges_without_clobbering_siblings() {
        let store = MemoryStore::new();
        let base = p("t/chats/c1");
        store.set(&base, json!({"metadata": {"chatId": "c1"}, "limits": {"u1": 1}})).await.unwrap();
        store
            .update_children(&base, vec![("limits/u1".into(), json!(2)), ("lastSeen/u1".into(), json!(9))])
            .await
            .unwrap();
        assert_eq!(
            store.get(&base).await.unwrap(),
            Some(json!({"metadata": {"chatId": "c1"}, "limits": {"u1": 2}, "lastSeen": {"u1": 9}}))
        );
    }
}
