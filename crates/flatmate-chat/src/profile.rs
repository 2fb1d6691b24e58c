// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display profile lookup.
//!
//! User records were written by several generations of clients, so one
//! concept can live under two field names. They are folded into a single
//! [`UserProfile`] here, once, instead of at every read site.

use serde::Serialize;
use serde_json::Value;

use flatmate_core::{FlatmateError, Namespace};

/// Fallback display name.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Display fields of one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
}

impl UserProfile {
    /// Normalize a raw `users/{uid}` document.
    pub fn from_document(doc: &Value) -> Self {
        Self {
            display_name: first_text(doc, &["displayName", "name"]),
            photo_url: first_text(doc, &["photoURL", "profileImage"]),
            phone_number: first_text(doc, &["phoneNumber"]),
        }
    }

    pub fn display_name_or_default(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
    }
}

/// First non-empty value among `fields`, with numbers rendered as text.
fn first_text(doc: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match doc.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Fetch and normalize the profile of `uid`. `None` when the user has no record.
pub async fn fetch_profile(ns: &Namespace, uid: &str) -> Result<Option<UserProfile>, FlatmateError> {
    let path = ns.at(&["users", uid])?;
    Ok(ns
        .store()
        .get(&path)
        .await?
        .map(|doc| UserProfile::from_document(&doc)))
}
