// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers, one module per API area.

pub mod chat;
pub mod health;
pub mod notifications;
pub mod offers;

use axum::Json;
use serde::Serialize;

/// Successful response: `{"success": true, ...body}`.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

pub fn success<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}
