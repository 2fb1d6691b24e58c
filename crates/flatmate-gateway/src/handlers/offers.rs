// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/property/{listing_id}/negotiate` endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Serialize;

use flatmate_chat::fetch_profile;
use flatmate_negotiation::{OfferView, SubmitOffer, VisitorCard};

use super::chat::OwnerQuery;
use super::{success, Success};
use crate::error::ApiError;
use crate::server::GatewayState;
use crate::session::RequestContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub existing_offer: Option<OfferView>,
}

/// POST /property/{listing_id}/negotiate
pub async fn submit(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    Path(listing_id): Path<String>,
    payload: Result<Json<SubmitOffer>, JsonRejection>,
) -> Result<Json<Success<OfferResponse>>, ApiError> {
    let Json(request) = payload?;
    let profile = fetch_profile(ctx.namespace(), ctx.uid())
        .await?
        .unwrap_or_default();
    let visitor = VisitorCard {
        name: profile.display_name,
        photo: profile.photo_url,
    };
    let offer = state
        .offers
        .submit(
            ctx.namespace(),
            &listing_id,
            ctx.uid(),
            request,
            visitor,
        )
        .await?;
    Ok(success(OfferResponse {
        message: Some("Offer submitted successfully!"),
        existing_offer: Some(offer),
    }))
}

/// GET /property/{listing_id}/negotiate/status?ownerId=
pub async fn status(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    Path(listing_id): Path<String>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<Success<OfferResponse>>, ApiError> {
    let Query(query) = query?;
    let existing_offer = state
        .offers
        .status(
            ctx.namespace(),
            query.owner_id.as_deref(),
            &listing_id,
            ctx.uid(),
        )
        .await?;
    Ok(success(OfferResponse {
        message: None,
        existing_offer,
    }))
}
