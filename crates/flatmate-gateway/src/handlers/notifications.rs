// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/notifications` endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use flatmate_core::FlatmateError;
use flatmate_notify::{MarkRead, NotificationItem};

use super::{success, Success};
use crate::error::ApiError;
use crate::server::GatewayState;
use crate::session::RequestContext;

#[derive(Debug, Serialize)]
pub struct Feed {
    pub notifications: Vec<NotificationItem>,
}

#[derive(Debug, Serialize)]
pub struct ReadAck {
    pub message: &'static str,
    pub updated: usize,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: usize,
}

/// GET /notifications
pub async fn list(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Success<Feed>>, ApiError> {
    let notifications = state
        .notifications
        .list(ctx.namespace(), ctx.uid())
        .await?;
    Ok(success(Feed { notifications }))
}

/// POST /notifications/read
///
/// `{notifId, node}` marks one item; an empty body (or either field
/// missing) marks everything.
pub async fn mark_read(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Result<Json<Success<ReadAck>>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        MarkRead::default()
    } else {
        serde_json::from_slice::<MarkRead>(&body)
            .map_err(|e| FlatmateError::Validation(format!("invalid request body: {e}")))?
    };
    let updated = state
        .notifications
        .mark_read(ctx.namespace(), ctx.uid(), &request)
        .await?;
    Ok(success(ReadAck {
        message: "Read status updated",
        updated,
    }))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Success<UnreadCount>>, ApiError> {
    let count = state
        .notifications
        .unread_count(ctx.namespace(), ctx.uid())
        .await?;
    Ok(success(UnreadCount { count }))
}
