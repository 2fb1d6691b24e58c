// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Both traits use `#[async_trait]` for dynamic dispatch compatibility, so
//! tenants can hold `Arc<dyn DocumentStore>` and `Arc<dyn IdentityVerifier>`.

pub mod identity;
pub mod store;

pub use identity::IdentityVerifier;
pub use store::DocumentStore;
