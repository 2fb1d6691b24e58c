// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rent negotiation offers.
//!
//! A visitor's offer is stored twice: under the owner's listing and in the
//! visitor's own `myOffers`, which feeds the offer notifications.

pub mod offer;
pub mod service;

pub use offer::{Offer, OfferStatus, OfferView, SubmitOffer, DEFAULT_VISITOR_NAME};
pub use service::{NegotiationService, VisitorCard};
