// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-tenant namespace resolution for the Flatmate messaging backend.
//!
//! A [`TenantRegistry`] turns an application name into a [`TenantHandle`]:
//! the tenant's data root inside its document store plus the verifier for
//! its session tokens.

pub mod credentials;
pub mod registry;
pub mod session;

pub use credentials::{EnvLookup, TenantCredentials};
pub use registry::{ConfiguredStoreConnector, StoreConnector, TenantHandle, TenantRegistry};
pub use session::SessionTokenVerifier;
