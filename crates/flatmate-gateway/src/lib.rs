// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the Flatmate backend.
//!
//! Every authenticated route runs inside one tenant, chosen per request, with
//! the caller identified by that tenant's session token.

pub mod error;
pub mod handlers;
pub mod server;
pub mod session;

pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState, HealthState};
pub use session::RequestContext;
