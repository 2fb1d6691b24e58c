// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Flatmate integration tests.
//!
//! # Components
//!
//! - [`TestHarness`] - configuration and tenant registry with test credentials
//! - [`FailingStore`] - in-memory store with injectable write failures
//! - [`SharedStoreConnector`] - hands one store to every tenant

pub mod harness;
pub mod mock_store;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_store::{FailingStore, SharedStoreConnector};
