// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use flatmate_core::Millis;

use crate::source::NotificationKind;

/// Keys set by the feed itself; stored copies are dropped from the payload.
const RESERVED: [&str; 5] = ["id", "type", "node", "visitorPhone", "propertyId"];

/// One entry of the merged feed.
///
/// The stored event is passed through as `payload`; the feed adds the kind
/// and the `node` the client sends back to mark the item read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    /// Only visits carry this; `null` unless the visitor is an interested lead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_phone: Option<Option<String>>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl NotificationItem {
    pub fn new(id: String, kind: NotificationKind, node: String, mut payload: Map<String, Value>) -> Self {
        for key in RESERVED {
            payload.remove(key);
        }
        Self {
            id,
            kind,
            node,
            property_id: None,
            visitor_phone: None,
            payload,
        }
    }

    pub fn is_read(&self) -> bool {
        is_read(&self.payload)
    }

    /// Sort key: `timestamp`, else `updatedAt`, else 0.
    pub fn sort_time(&self) -> Millis {
        ["timestamp", "updatedAt"]
            .iter()
            .filter_map(|field| self.payload.get(*field).and_then(millis))
            .find(|t| *t != 0)
            .unwrap_or(0)
    }
}

/// True when an event record has been marked read.
pub(crate) fn is_read(record: &Map<String, Value>) -> bool {
    record.get("isRead").and_then(Value::as_bool).unwrap_or(false)
}

fn millis(value: &Value) -> Option<Millis> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as Millis))
}

/// Body of a mark-read request. Both fields set marks one item; otherwise all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRead {
    #[serde(default)]
    pub notif_id: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
}

impl MarkRead {
    /// The targeted `(node, id)` pair, if the request names one item.
    pub fn target(&self) -> Option<(&str, &str)> {
        let node = self.node.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let id = self.notif_id.as_deref().map(str::trim).filter(|i| !i.is_empty())?;
        Some((node, id))
    }
}
