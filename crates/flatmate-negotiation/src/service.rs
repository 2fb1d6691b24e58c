// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::info;

use flatmate_core::{now_millis, FlatmateError, Namespace, StorePath};

use crate::offer::{Offer, OfferStatus, OfferView, SubmitOffer, DEFAULT_VISITOR_NAME};

/// Visitor display fields copied onto the offer.
#[derive(Debug, Clone, Default)]
pub struct VisitorCard {
    pub name: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NegotiationService;

impl NegotiationService {
    pub fn new() -> Self {
        Self
    }

    /// Record (or replace) `visitor_id`'s offer on `listing_id`.
    ///
    /// The owner's negotiation entry and the visitor's `myOffers` entry are
    /// written together; a new submission resets the status to pending and
    /// so shows up unread again.
    pub async fn submit(
        &self,
        ns: &Namespace,
        listing_id: &str,
        visitor_id: &str,
        request: SubmitOffer,
        visitor: VisitorCard,
    ) -> Result<OfferView, FlatmateError> {
        let owner_id = required(request.owner_id.as_deref(), "owner id is required")?;
        let listing_id = required(Some(listing_id), "listing id is required")?;
        if owner_id == visitor_id {
            return Err(FlatmateError::Validation(
                "cannot make an offer on your own listing".to_string(),
            ));
        }
        if request.offer_amount <= 0.0 {
            return Err(FlatmateError::Validation(
                "offer amount must be a positive number".to_string(),
            ));
        }

        let offer = Offer {
            listing_id: listing_id.to_string(),
            visitor_id: visitor_id.to_string(),
            owner_id: owner_id.to_string(),
            offer_amount: request.offer_amount,
            original_rent: request.current_rent,
            status: OfferStatus::Pending,
            visitor_name: visitor
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_VISITOR_NAME.to_string()),
            visitor_photo: visitor.photo.unwrap_or_default(),
            updated_at: Some(now_millis()),
        };
        let record = serde_json::to_value(&offer)?;
        ns.store()
            .multi_update(vec![
                (negotiation_path(ns, owner_id, listing_id, visitor_id)?, record.clone()),
                (ns.at(&["users", visitor_id, "myOffers", listing_id])?, record),
            ])
            .await?;

        info!(
            tenant = %ns.name(),
            listing = %listing_id,
            visitor = %visitor_id,
            amount = offer.offer_amount,
            "offer submitted"
        );
        Ok(offer.view())
    }

    /// The visitor's current offer on the listing, if any.
    pub async fn status(
        &self,
        ns: &Namespace,
        owner_id: Option<&str>,
        listing_id: &str,
        visitor_id: &str,
    ) -> Result<Option<OfferView>, FlatmateError> {
        let owner_id = required(owner_id, "owner id is required")?;
        let listing_id = required(Some(listing_id), "listing id is required")?;
        let path = negotiation_path(ns, owner_id, listing_id, visitor_id)?;
        match ns.store().get(&path).await? {
            Some(doc) => Ok(Some(serde_json::from_value::<Offer>(doc)?.view())),
            None => Ok(None),
        }
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, FlatmateError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| FlatmateError::Validation(message.to_string()))
}

fn negotiation_path(
    ns: &Namespace,
    owner_id: &str,
    listing_id: &str,
    visitor_id: &str,
) -> Result<StorePath, FlatmateError> {
    ns.at(&["users", owner_id, "property", listing_id, "negotiations", visitor_id])
}
