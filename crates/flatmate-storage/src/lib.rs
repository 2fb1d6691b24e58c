// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document store backends for the Flatmate messaging backend.
//!
//! Both backends implement [`DocumentStore`] over the same flattened leaf
//! layout: a WAL-mode SQLite file with embedded migrations, serialized
//! through `tokio-rusqlite`, and a process-local tree for tests and
//! throwaway tenants.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod push_id;
pub mod sqlite;
mod tree;

use std::sync::Arc;

use flatmate_config::StoreBackend;
use flatmate_core::{DocumentStore, FlatmateError};

pub use database::Database;
pub use memory::MemoryStore;
pub use push_id::PushIdGenerator;
pub use sqlite::SqliteStore;

/// Open a store of the given kind. `database_path` is ignored for memory stores.
pub async fn connect(
    backend: StoreBackend,
    database_path: &str,
) -> Result<Arc<dyn DocumentStore>, FlatmateError> {
    match backend {
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::open(database_path).await?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
