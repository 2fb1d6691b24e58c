// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The merged notification feed and its read state.
//!
//! All three sources are subtrees of the user's own record, so the feed and
//! the unread count are both computed from one read of `users/{uid}`. Bulk
//! mark-read writes each source separately; a partial failure leaves the
//! remaining items unread for the next attempt.

use std::cmp::Reverse;

use serde_json::{Map, Value};
use tracing::{debug, info};

use flatmate_chat::UserProfile;
use flatmate_core::{FlatmateError, Namespace};

use crate::model::{is_read, MarkRead, NotificationItem};
use crate::source::{item_address, NotificationKind, Source};

#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationAggregator;

impl NotificationAggregator {
    pub fn new() -> Self {
        Self
    }

    /// The user's visits, offers and reviews, newest first.
    pub async fn list(
        &self,
        ns: &Namespace,
        uid: &str,
    ) -> Result<Vec<NotificationItem>, FlatmateError> {
        let record = user_record(ns, uid).await?;
        let owner_phone = UserProfile::from_document(&record).phone_number;

        let mut items = Vec::new();
        for source in sources_of(&record) {
            for (key, event) in events(&record, &source) {
                items.push(to_item(&source, &key, event.clone(), owner_phone.as_deref()));
            }
        }
        items.sort_by_key(|item| Reverse(item.sort_time()));

        debug!(tenant = %ns.name(), uid = %uid, count = items.len(), "notifications listed");
        Ok(items)
    }

    /// Mark one item, or every unread item, as read. Returns how many flipped.
    pub async fn mark_read(
        &self,
        ns: &Namespace,
        uid: &str,
        request: &MarkRead,
    ) -> Result<usize, FlatmateError> {
        match request.target() {
            Some((node, notif_id)) => self.mark_one(ns, uid, node, notif_id).await,
            None => self.mark_all(ns, uid).await,
        }
    }

    async fn mark_one(
        &self,
        ns: &Namespace,
        uid: &str,
        node: &str,
        notif_id: &str,
    ) -> Result<usize, FlatmateError> {
        let path = ns.at(&["users", uid])?.join(&item_address(node, notif_id)?)?;
        let Some(Value::Object(event)) = ns.store().get(&path).await? else {
            debug!(uid = %uid, path = %path, "mark-read target does not exist");
            return Ok(0);
        };
        if is_read(&event) {
            return Ok(0);
        }
        ns.store().set(&path.child("isRead")?, Value::Bool(true)).await?;
        Ok(1)
    }

    async fn mark_all(&self, ns: &Namespace, uid: &str) -> Result<usize, FlatmateError> {
        let record = user_record(ns, uid).await?;
        let mut writes = Vec::new();
        for source in sources_of(&record) {
            let unread: Vec<(String, Value)> = events(&record, &source)
                .filter(|(_, event)| !is_read(event))
                .map(|(key, _)| (format!("{key}/isRead"), Value::Bool(true)))
                .collect();
            if unread.is_empty() {
                continue;
            }
            let container = source.container(ns, uid)?;
            writes.push(async move {
                let count = unread.len();
                ns.store().update_children(&container, unread).await?;
                Ok::<usize, FlatmateError>(count)
            });
        }

        let marked: usize = futures::future::try_join_all(writes).await?.into_iter().sum();
        info!(tenant = %ns.name(), uid = %uid, count = marked, "notifications marked read");
        Ok(marked)
    }

    /// Unread items across all three sources.
    pub async fn unread_count(&self, ns: &Namespace, uid: &str) -> Result<usize, FlatmateError> {
        let record = user_record(ns, uid).await?;
        Ok(sources_of(&record)
            .iter()
            .map(|source| events(&record, source).filter(|(_, e)| !is_read(e)).count())
            .sum())
    }
}

async fn user_record(ns: &Namespace, uid: &str) -> Result<Value, FlatmateError> {
    let path = ns.at(&["users", uid])?;
    Ok(ns.store().get(&path).await?.unwrap_or(Value::Null))
}

/// Sources present for this user: visits, offers, and reviews of each owned listing.
fn sources_of(record: &Value) -> Vec<Source> {
    let listings: Vec<String> = record
        .get("property")
        .map(|props| children(props).into_iter().map(|(key, _)| key).collect())
        .unwrap_or_default();
    Source::all(listings.iter().map(String::as_str))
}

/// Object children of one source container. Non-object children are not events.
fn events<'a>(
    record: &'a Value,
    source: &Source,
) -> impl Iterator<Item = (String, &'a Map<String, Value>)> + 'a {
    let node = source.node();
    let container = node
        .split('/')
        .try_fold(record, |value, segment| child(value, segment));
    container
        .map(children)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| value.as_object().map(|event| (key, event)))
}

/// Keyed children of a node. The store reads a node whose keys are exactly
/// `0..n` back as an array; its indices are those keys.
fn children(node: &Value) -> Vec<(String, &Value)> {
    match node {
        Value::Object(map) => map.iter().map(|(key, value)| (key.clone(), value)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect(),
        _ => Vec::new(),
    }
}

fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => node.get(key),
    }
}

fn to_item(
    source: &Source,
    key: &str,
    event: Map<String, Value>,
    owner_phone: Option<&str>,
) -> NotificationItem {
    match source {
        Source::Visits => {
            let lead = event
                .get("isInterestedLead")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let mut item =
                NotificationItem::new(key.to_string(), NotificationKind::Visit, source.node(), event);
            item.visitor_phone = Some(if lead { owner_phone.map(str::to_string) } else { None });
            item
        }
        Source::Offers => {
            NotificationItem::new(key.to_string(), NotificationKind::Offer, source.node(), event)
        }
        Source::Reviews { listing } => {
            let mut item = NotificationItem::new(
                format!("{listing}_{key}"),
                NotificationKind::Review,
                format!("{}/{key}", source.node()),
                event,
            );
            item.property_id = Some(listing.clone());
            item
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use flatmate_core::StorePath;
    use flatmate_storage::MemoryStore;
    use serde_json::json;

    fn namespace() -> Namespace {
        Namespace::new(
            "flatmate",
            StorePath::parse("flatmate").unwrap(),
            Arc::new(MemoryStore::new()),
        )
    }

    async fn seed(ns: &Namespace) {
        ns.store()
            .set(
                &ns.at(&["users", "owner"]).unwrap(),
                json!({
                    "name": "Meera",
                    "phoneNumber": "9000000001",
                    "notifications": {"visits": {
                        "v1": {"timestamp": 300, "isInterestedLead": true, "isRead": false},
                        "v2": {"timestamp": 100, "isRead": true}
                    }},
                    "myOffers": {"p9": {"offerAmount": 9000, "updatedAt": 200}},
                    "property": {"p1": {
                        "title": "2BHK",
                        "reviews": {"r1": {"rating": 4, "timestamp": 400}}
                    }}
                }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn feed_merges_sources_newest_first() {
        let ns = namespace();
        seed(&ns).await;
        let feed = NotificationAggregator::new().list(&ns, "owner").await.unwrap();

        let ids: Vec<_> = feed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["p1_r1", "v1", "p9", "v2"]);

        assert_eq!(feed[0].kind, NotificationKind::Review);
        assert_eq!(feed[0].node, "property/p1/reviews/r1");
        assert_eq!(feed[0].property_id.as_deref(), Some("p1"));
        assert_eq!(feed[1].visitor_phone, Some(Some("9000000001".to_string())));
        assert_eq!(feed[2].node, "myOffers");
        assert_eq!(feed[3].visitor_phone, Some(None));
    }

    #[tokio::test]
    async fn unread_count_sums_all_sources() {
        let ns = namespace();
        seed(&ns).await;
        let agg = NotificationAggregator::new();
        assert_eq!(agg.unread_count(&ns, "owner").await.unwrap(), 3);
        assert_eq!(agg.unread_count(&ns, "stranger").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn targeted_mark_read_flips_one_item() {
        let ns = namespace();
        seed(&ns).await;
        let agg = NotificationAggregator::new();
        let request = MarkRead {
            notif_id: Some("p1_r1".into()),
            node: Some("property/p1/reviews/r1".into()),
        };
        assert_eq!(agg.mark_read(&ns, "owner", &request).await.unwrap(), 1);
        assert_eq!(agg.mark_read(&ns, "owner", &request).await.unwrap(), 0);
        assert_eq!(agg.unread_count(&ns, "owner").await.unwrap(), 2);

        let review = ns
            .store()
            .get(&ns.at(&["users", "owner", "property", "p1", "reviews", "r1"]).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(review, json!({"rating": 4, "timestamp": 400, "isRead": true}));
    }

    #[tokio::test]
    async fn targeted_mark_read_of_missing_item_writes_nothing() {
        let ns = namespace();
        seed(&ns).await;
        let request = MarkRead {
            notif_id: Some("ghost".into()),
            node: Some("notifications/visits".into()),
        };
        let agg = NotificationAggregator::new();
        assert_eq!(agg.mark_read(&ns, "owner", &request).await.unwrap(), 0);
        let ghost = ns
            .store()
            .get(&ns.at(&["users", "owner", "notifications", "visits", "ghost"]).unwrap())
            .await
            .unwrap();
        assert_eq!(ghost, None);
    }

    #[tokio::test]
    async fn bulk_mark_read_is_idempotent() {
        let ns = namespace();
        seed(&ns).await;
        let agg = NotificationAggregator::new();

        assert_eq!(agg.mark_read(&ns, "owner", &MarkRead::default()).await.unwrap(), 3);
        let after_first = ns.store().get(&ns.at(&["users", "owner"]).unwrap()).await.unwrap();

        assert_eq!(agg.mark_read(&ns, "owner", &MarkRead::default()).await.unwrap(), 0);
        let after_second = ns.store().get(&ns.at(&["users", "owner"]).unwrap()).await.unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(agg.unread_count(&ns, "owner").await.unwrap(), 0);
        // Unrelated parts of the record are untouched.
        assert_eq!(after_second.unwrap()["property"]["p1"]["title"], "2BHK");
    }

    #[tokio::test]
    async fn marking_outside_notification_sources_is_refused() {
        let ns = namespace();
        seed(&ns).await;
        let request = MarkRead {
            notif_id: Some("p1".into()),
            node: Some("property".into()),
        };
        assert!(matches!(
            NotificationAggregator::new().mark_read(&ns, "owner", &request).await,
            Err(FlatmateError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn index_keyed_containers_are_walked() {
        let ns = namespace();
        ns.store()
            .set(
                &ns.at(&["users", "owner"]).unwrap(),
                json!({
                    "property": {"0": {"reviews": {"r1": {"timestamp": 20, "isRead": false}}}},
                    "myOffers": {"0": {"offerAmount": 9000, "updatedAt": 10}}
                }),
            )
            .await
            .unwrap();
        let agg = NotificationAggregator::new();

        let feed = agg.list(&ns, "owner").await.unwrap();
        let ids: Vec<_> = feed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["0_r1", "0"]);
        assert_eq!(feed[0].node, "property/0/reviews/r1");
        assert_eq!(agg.unread_count(&ns, "owner").await.unwrap(), 2);

        assert_eq!(agg.mark_read(&ns, "owner", &MarkRead::default()).await.unwrap(), 2);
        assert_eq!(agg.unread_count(&ns, "owner").await.unwrap(), 0);
        let offer = ns
            .store()
            .get(&ns.at(&["users", "owner", "myOffers", "0", "isRead"]).unwrap())
            .await
            .unwrap();
        assert_eq!(offer, Some(json!(true)));
    }
}
