// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where each kind of notification lives under `users/{uid}`.
//!
//! ```text
//! notifications/visits/{id}                  visit events
//! myOffers/{listing}                         offer events
//! property/{listing}/reviews/{reviewer}      one review per reviewer per owned listing
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use flatmate_core::{FlatmateError, Namespace, StorePath};

/// The three event streams merged into the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Visit,
    Offer,
    Review,
}

/// One container of notification items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Visits,
    Offers,
    Reviews { listing: String },
}

impl Source {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Source::Visits => NotificationKind::Visit,
            Source::Offers => NotificationKind::Offer,
            Source::Reviews { .. } => NotificationKind::Review,
        }
    }

    /// Container address relative to the user's record.
    pub fn node(&self) -> String {
        match self {
            Source::Visits => "notifications/visits".to_string(),
            Source::Offers => "myOffers".to_string(),
            Source::Reviews { listing } => format!("property/{listing}/reviews"),
        }
    }

    /// Absolute container path for `uid`.
    pub fn container(&self, ns: &Namespace, uid: &str) -> Result<StorePath, FlatmateError> {
        ns.at(&["users", uid])?.join(&self.node())
    }

    /// Every source owned by a user with the given listings.
    pub fn all<'a>(listings: impl IntoIterator<Item = &'a str>) -> Vec<Source> {
        let mut sources = vec![Source::Visits, Source::Offers];
        sources.extend(listings.into_iter().map(|l| Source::Reviews {
            listing: l.to_string(),
        }));
        sources
    }
}

/// Resolve a client-supplied `(node, notifId)` pair to the item's path
/// relative to the user's record.
///
/// Only the three notification containers are addressable. Review items are
/// reported with their full address as `node`, so for those the id is not
/// appended again.
pub fn item_address(node: &str, notif_id: &str) -> Result<String, FlatmateError> {
    let node = node.trim_matches('/');
    let segments: Vec<&str> = node.split('/').collect();
    let with_id = |container: &str| {
        flatmate_core::path::validate_segment(notif_id)?;
        Ok(format!("{container}/{notif_id}"))
    };
    match segments.as_slice() {
        ["notifications", "visits"] | ["myOffers"] => with_id(node),
        ["property", _, "reviews"] => with_id(node),
        ["property", _, "reviews", _] => Ok(node.to_string()),
        _ => Err(FlatmateError::Validation(format!(
            "`{node}` is not a notification source"
        ))),
    }
}
