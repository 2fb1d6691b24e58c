// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Flatmate messaging backend.
//!
//! This crate provides the error type, hierarchical store paths, tenant
//! namespaces, and the adapter traits that the persistence and
//! authentication backends implement.

pub mod error;
pub mod path;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FlatmateError;
pub use path::StorePath;
pub use types::{now_millis, Caller, Millis, Namespace};

pub use traits::{DocumentStore, IdentityVerifier};
