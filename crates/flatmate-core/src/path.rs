// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-separated addresses into the hierarchical document store.

use std::fmt;

use crate::error::FlatmateError;

/// Characters a path segment may never contain.
const FORBIDDEN: [char; 6] = ['.', '#', '$', '[', ']', '/'];

/// A validated address of a node in the document tree.
///
/// The empty path addresses the store root. Every segment is non-empty and
/// free of the characters the store reserves for its own syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The root of the store.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path, ignoring leading and trailing slashes.
    pub fn parse(raw: &str) -> Result<Self, FlatmateError> {
        let mut path = Self::root();
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(path);
        }
        for segment in trimmed.split('/') {
            path.push(segment)?;
        }
        Ok(path)
    }

    /// Append one validated segment in place.
    pub fn push(&mut self, segment: &str) -> Result<(), FlatmateError> {
        validate_segment(segment)?;
        self.segments.push(segment.to_string());
        Ok(())
    }

    /// Return a new path with one more segment.
    pub fn child(&self, segment: &str) -> Result<Self, FlatmateError> {
        let mut next = self.clone();
        next.push(segment)?;
        Ok(next)
    }

    /// Return a new path extended by a relative `/`-separated path.
    pub fn join(&self, relative: &str) -> Result<Self, FlatmateError> {
        let tail = Self::parse(relative)?;
        let mut next = self.clone();
        next.segments.extend(tail.segments);
        Ok(next)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, if any.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// True if `self` is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &StorePath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// True if either path contains the other (or they are equal).
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self == other || self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }

    /// All proper ancestors, excluding the root, shortest first.
    pub fn ancestors(&self) -> Vec<StorePath> {
        (1..self.segments.len())
            .map(|n| StorePath {
                segments: self.segments[..n].to_vec(),
            })
            .collect()
    }

    /// Segments of `self` below `base`, or `None` if `base` is not a prefix.
    pub fn strip_prefix(&self, base: &StorePath) -> Option<&[String]> {
        if self == base || base.is_ancestor_of(self) {
            Some(&self.segments[base.segments.len()..])
        } else {
            None
        }
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Check a single user- or system-supplied key before it becomes part of a path.
pub fn validate_segment(segment: &str) -> Result<(), FlatmateError> {
    if segment.is_empty() {
        return Err(FlatmateError::Validation(
            "path segment must not be empty".to_string(),
        ));
    }
    if let Some(bad) = segment.chars().find(|c| FORBIDDEN.contains(c) || c.is_control()) {
        return Err(FlatmateError::Validation(format!(
            "path segment `{segment}` contains forbidden character {bad:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let path = StorePath::parse("/flatmate/users/u1/").unwrap();
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.to_string(), "flatmate/users/u1");
        assert_eq!(path.key(), Some("u1"));
    }

    #[test]
    fn empty_string_is_root() {
        assert!(StorePath::parse("").unwrap().is_root());
        assert!(StorePath::parse("/").unwrap().is_root());
    }

    #[test]
    fn rejects_reserved_characters() {
        assert!(StorePath::parse("users/a.b").is_err());
        assert!(StorePath::parse("users/a#b").is_err());
        assert!(StorePath::parse("users//b").is_err());
        assert!(StorePath::root().child("x/y").is_err());
        assert!(StorePath::root().child("").is_err());
    }

    #[test]
    fn ancestry_and_overlap() {
        let a = StorePath::parse("chats/c1").unwrap();
        let b = StorePath::parse("chats/c1/limits/u1").unwrap();
        let c = StorePath::parse("chats/c10").unwrap();
        assert!(a.is_ancestor_of(&b));
        assert!(!b.is_ancestor_of(&a));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(
            b.ancestors()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["chats", "chats/c1", "chats/c1/limits"]
        );
    }

    #[test]
    fn strip_prefix_returns_relative_segments() {
        let base = StorePath::parse("a/b").unwrap();
        let full = StorePath::parse("a/b/c/d").unwrap();
        assert_eq!(full.strip_prefix(&base).unwrap(), ["c", "d"]);
        assert!(base.strip_prefix(&full).is_none());
        assert!(base.strip_prefix(&base).unwrap().is_empty());
    }

    #[test]
    fn join_extends_path() {
        let base = StorePath::parse("flatmate").unwrap();
        let joined = base.join("users/u1/myChats").unwrap();
        assert_eq!(joined.to_string(), "flatmate/users/u1/myChats");
    }
}
