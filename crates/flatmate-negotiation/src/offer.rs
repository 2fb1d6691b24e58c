// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offer records as stored and as returned to clients.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use flatmate_core::Millis;

/// Default name for visitors whose session carries none.
pub const DEFAULT_VISITOR_NAME: &str = "Guest";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Countered,
}

impl OfferStatus {
    /// Unknown or missing statuses read as pending.
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for OfferStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(Self::normalize(raw.as_ref().and_then(Value::as_str)))
    }
}

/// One visitor's offer on one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub listing_id: String,
    pub visitor_id: String,
    pub owner_id: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub offer_amount: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub original_rent: f64,
    #[serde(default)]
    pub status: OfferStatus,
    #[serde(default)]
    pub visitor_name: String,
    #[serde(default)]
    pub visitor_photo: String,
    #[serde(default)]
    pub updated_at: Option<Millis>,
}

impl Offer {
    /// How far below the rent the offer is, e.g. `"10.0%"`; `"0%"` when unknown.
    pub fn discount_percent(&self) -> String {
        if self.original_rent > 0.0 && self.offer_amount > 0.0 {
            let diff = self.original_rent - self.offer_amount;
            format!("{:.1}%", diff / self.original_rent * 100.0)
        } else {
            "0%".to_string()
        }
    }

    pub fn view(self) -> OfferView {
        OfferView {
            discount_percent: self.discount_percent(),
            offer: self,
        }
    }
}

/// An offer with its derived discount, as sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
    #[serde(flatten)]
    pub offer: Offer,
    pub discount_percent: String,
}

/// Body of an offer submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOffer {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub offer_amount: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub current_rent: f64,
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Numbers may arrive as JSON numbers or numeric strings; anything else is 0.
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    })
}
