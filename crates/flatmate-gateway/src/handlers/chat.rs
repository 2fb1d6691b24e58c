// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/chat/*` endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use flatmate_chat::{
    BulkReceipt, ChatStatus, ChatStatusSummary, ConversationSummary, ConversationView, SendBulk,
    SendMessage, SendReceipt,
};

use super::{success, Success};
use crate::error::ApiError;
use crate::server::GatewayState;
use crate::session::RequestContext;

type ApiResult<T> = Result<Json<Success<T>>, ApiError>;

/// POST /chat/send
pub async fn send(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<SendMessage>, JsonRejection>,
) -> ApiResult<SendReceipt> {
    let Json(request) = payload?;
    let receipt = state.chat.send(ctx.namespace(), ctx.uid(), request).await?;
    Ok(success(receipt))
}

/// POST /chat/send-bulk
pub async fn send_bulk(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<SendBulk>, JsonRejection>,
) -> ApiResult<BulkReceipt> {
    let Json(request) = payload?;
    let receipt = state
        .chat
        .send_bulk(ctx.namespace(), ctx.uid(), request)
        .await?;
    Ok(success(receipt))
}

/// GET /chat/messages/{chat_id}
pub async fn messages(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    Path(chat_id): Path<String>,
) -> ApiResult<ConversationView> {
    let view = state.chat.read(ctx.namespace(), ctx.uid(), &chat_id).await?;
    Ok(success(view))
}

#[derive(Debug, Serialize)]
pub struct ChatList {
    pub chats: Vec<ConversationSummary>,
}

/// GET /chat/list
pub async fn list(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<ChatList> {
    let chats = state.chat.list(ctx.namespace(), ctx.uid()).await?;
    Ok(success(ChatList { chats }))
}

#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    #[serde(rename = "ownerId")]
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub chat_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatStatusSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_chat_id: Option<String>,
}

impl From<ChatStatus> for StatusResponse {
    fn from(status: ChatStatus) -> Self {
        match status {
            ChatStatus::Exists(summary) => Self {
                chat_exists: true,
                chat: Some(summary),
                suggested_chat_id: None,
            },
            ChatStatus::Missing { suggested_chat_id } => Self {
                chat_exists: false,
                chat: None,
                suggested_chat_id: Some(suggested_chat_id),
            },
        }
    }
}

/// GET /chat/status/{property_id}?ownerId=
pub async fn status(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    Path(property_id): Path<String>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> ApiResult<StatusResponse> {
    let Query(query) = query?;
    let owner = query.owner_id.unwrap_or_default();
    let status = state
        .chat
        .status(ctx.namespace(), ctx.uid(), &owner, &property_id)
        .await?;
    Ok(success(status.into()))
}
