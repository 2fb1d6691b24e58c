// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flattening JSON documents into addressed leaves and back.
//!
//! Both backends keep one entry per scalar, keyed by its full slash-joined
//! path. A write removes the target's subtree and any scalar sitting on one
//! of its ancestors, then inserts the new leaves. Reads collect every leaf
//! under a path and rebuild the document.

use serde_json::{Map, Value};

use flatmate_core::{FlatmateError, StorePath};
use flatmate_core::path::validate_segment;

/// Storage primitive both backends implement over their leaf table.
pub(crate) trait LeafTable {
    type Error;

    /// All `(key, json)` leaves at or below `key`. The empty key is the root.
    fn read_subtree(&self, key: &str) -> Result<Vec<(String, String)>, Self::Error>;

    /// Remove every leaf at or below `key`.
    fn delete_subtree(&mut self, key: &str) -> Result<(), Self::Error>;

    /// Remove the single leaf stored exactly at `key`, if any.
    fn delete_leaf(&mut self, key: &str) -> Result<(), Self::Error>;

    fn insert_leaf(&mut self, key: &str, json: &str) -> Result<(), Self::Error>;
}

/// A write whose value has already been flattened and validated.
#[derive(Debug, Clone)]
pub(crate) struct PreparedWrite {
    path: StorePath,
    leaves: Vec<(String, String)>,
}

/// Validate and flatten a batch of writes.
///
/// Rejects overlapping targets, invalid object keys inside values, and
/// scalar writes to the root. Nothing is touched on failure.
pub(crate) fn prepare(updates: Vec<(StorePath, Value)>) -> Result<Vec<PreparedWrite>, FlatmateError> {
    for (i, (a, _)) in updates.iter().enumerate() {
        for (b, _) in &updates[i + 1..] {
            if a.overlaps(b) {
                return Err(FlatmateError::Validation(format!(
                    "overlapping update paths `{a}` and `{b}`"
                )));
            }
        }
    }

    updates
        .into_iter()
        .map(|(path, value)| {
            if path.is_root() && !matches!(value, Value::Object(_) | Value::Null) {
                return Err(FlatmateError::Validation(
                    "the store root can only hold an object".to_string(),
                ));
            }
            let mut leaves = Vec::new();
            flatten_into(&path.to_string(), &value, &mut leaves)?;
            Ok(PreparedWrite { path, leaves })
        })
        .collect()
}

fn flatten_into(
    key: &str,
    value: &Value,
    out: &mut Vec<(String, String)>,
) -> Result<(), FlatmateError> {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child, v) in map {
                validate_segment(child)?;
                flatten_into(&join_key(key, child), v, out)?;
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_into(&join_key(key, &i.to_string()), v, out)?;
            }
        }
        scalar => out.push((key.to_string(), scalar.to_string())),
    }
    Ok(())
}

fn join_key(base: &str, child: &str) -> String {
    if base.is_empty() {
        child.to_string()
    } else {
        format!("{base}/{child}")
    }
}

/// Apply prepared writes in order against a leaf table.
pub(crate) fn apply_all<T: LeafTable>(
    table: &mut T,
    writes: &[PreparedWrite],
) -> Result<(), T::Error> {
    for write in writes {
        let key = write.path.to_string();
        table.delete_subtree(&key)?;
        for ancestor in write.path.ancestors() {
            table.delete_leaf(&ancestor.to_string())?;
        }
        for (leaf, json) in &write.leaves {
            table.insert_leaf(leaf, json)?;
        }
    }
    Ok(())
}

/// Read and rebuild the document at `path`.
pub(crate) fn read<T: LeafTable>(
    table: &T,
    path: &StorePath,
) -> Result<Result<Option<Value>, serde_json::Error>, T::Error> {
    let rows = table.read_subtree(&path.to_string())?;
    Ok(assemble(path.segments().len(), rows))
}

/// True if the document at `guard` currently equals `expected`.
///
/// `None` and an explicit `null` both mean "absent".
pub(crate) fn guard_holds<T: LeafTable>(
    table: &T,
    guard: &StorePath,
    expected: &Option<Value>,
) -> Result<Result<bool, serde_json::Error>, T::Error> {
    let current = match read(table, guard)? {
        Ok(current) => current,
        Err(err) => return Ok(Err(err)),
    };
    let expected = expected.as_ref().filter(|v| !v.is_null());
    Ok(Ok(current.as_ref() == expected))
}

/// Rebuild a document from leaves whose keys lie under a path of `depth` segments.
pub(crate) fn assemble(
    depth: usize,
    rows: Vec<(String, String)>,
) -> Result<Option<Value>, serde_json::Error> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut root = Value::Null;
    for (key, json) in rows {
        let leaf: Value = serde_json::from_str(&json)?;
        let relative: Vec<&str> = key
            .split('/')
            .filter(|s| !s.is_empty())
            .skip(depth)
            .collect();
        if relative.is_empty() {
            // The path itself holds a scalar.
            return Ok(Some(leaf));
        }
        insert_at(&mut root, &relative, leaf);
    }

    Ok(Some(restore_arrays(root)))
}

fn insert_at(node: &mut Value, path: &[&str], leaf: Value) {
    match path.split_first() {
        None => *node = leaf,
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(head.to_string()).or_insert(Value::Null);
                insert_at(child, rest, leaf);
            }
        }
    }
}

/// Objects whose keys are exactly `0..n` were written as arrays.
fn restore_arrays(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let is_sequence = !map.is_empty()
                && (0..map.len()).all(|i| map.contains_key(&i.to_string()));
            if is_sequence {
                let mut items: Vec<(usize, Value)> = map
                    .into_iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, restore_arrays(v))))
                    .collect();
                items.sort_by_key(|(i, _)| *i);
                Value::Array(items.into_iter().map(|(_, v)| v).collect())
            } else {
                Value::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, restore_arrays(v)))
                        .collect(),
                )
            }
        }
        other => other,
    }
}

/// Half-open key range `[key/, key0)` covering every strict descendant of `key`.
pub(crate) fn descendant_range(key: &str) -> (String, String) {
    (format!("{key}/"), format!("{key}0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn p(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    fn write(table: &mut BTreeMap<String, String>, path: &str, value: Value) {
        let prepared = prepare(vec![(p(path), value)]).unwrap();
        let Ok(()) = apply_all(table, &prepared);
    }

    fn get(table: &BTreeMap<String, String>, path: &str) -> Option<Value> {
        let Ok(result) = read(table, &p(path));
        result.unwrap()
    }

    #[test]
    fn object_round_trips_with_arrays() {
        let mut table = BTreeMap::new();
        let doc = json!({"participants": ["a", "b"], "lastMessage": {"text": "hi", "timestamp": 5}});
        write(&mut table, "chats/c1/metadata", doc.clone());
        assert_eq!(get(&table, "chats/c1/metadata"), Some(doc));
        assert_eq!(get(&table, "chats/c1/metadata/lastMessage/text"), Some(json!("hi")));
        assert_eq!(get(&table, "chats/c1/metadata/participants/1"), Some(json!("b")));
    }

    #[test]
    fn writing_replaces_subtree_and_scalar_ancestors() {
        let mut table = BTreeMap::new();
        write(&mut table, "a", json!({"x": 1, "y": 2}));
        write(&mut table, "a", json!({"z": 3}));
        assert_eq!(get(&table, "a"), Some(json!({"z": 3})));

        write(&mut table, "b", json!(true));
        write(&mut table, "b/c", json!(1));
        assert_eq!(get(&table, "b"), Some(json!({"c": 1})));
    }

    #[test]
    fn null_and_empty_values_delete() {
        let mut table = BTreeMap::new();
        write(&mut table, "a/b", json!(1));
        write(&mut table, "a/b", Value::Null);
        assert_eq!(get(&table, "a"), None);

        write(&mut table, "a/c", json!(1));
        write(&mut table, "a/c", json!({}));
        assert_eq!(get(&table, "a/c"), None);
    }

    #[test]
    fn sibling_prefixes_do_not_collide() {
        let mut table = BTreeMap::new();
        write(&mut table, "chats/c1", json!({"v": 1}));
        write(&mut table, "chats/c10", json!({"v": 10}));
        write(&mut table, "chats/c1-x", json!({"v": 2}));
        write(&mut table, "chats/c1", Value::Null);
        assert_eq!(get(&table, "chats/c10"), Some(json!({"v": 10})));
        assert_eq!(get(&table, "chats/c1-x"), Some(json!({"v": 2})));
    }

    #[test]
    fn prepare_rejects_overlap_and_bad_keys() {
        assert!(prepare(vec![(p("a"), json!(1)), (p("a/b"), json!(2))]).is_err());
        assert!(prepare(vec![(p("a"), json!({"bad.key": 1}))]).is_err());
        assert!(prepare(vec![(StorePath::root(), json!(1))]).is_err());
        assert!(prepare(vec![(p("a/b"), json!(1)), (p("a/c"), json!(2))]).is_ok());
    }

    #[test]
    fn guard_compares_whole_document() {
        let mut table = BTreeMap::new();
        let Ok(holds) = guard_holds(&table, &p("limits/u1"), &None);
        assert!(holds.unwrap());
        write(&mut table, "limits/u1", json!(2));
        let Ok(holds) = guard_holds(&table, &p("limits/u1"), &Some(json!(2)));
        assert!(holds.unwrap());
        let Ok(holds) = guard_holds(&table, &p("limits/u1"), &Some(json!(1)));
        assert!(!holds.unwrap());
    }

    #[test]
    fn descendant_range_excludes_siblings() {
        let (lo, hi) = descendant_range("chats/c1");
        assert!("chats/c1/x".to_string() >= lo && "chats/c1/x".to_string() < hi);
        assert!(!("chats/c10".to_string() >= lo && "chats/c10".to_string() < hi));
    }
}
