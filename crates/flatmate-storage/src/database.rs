// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, which is what makes each store call atomic with respect to the
//! others on the same file.

use std::path::Path;

use tracing::debug;

use flatmate_core::FlatmateError;

use crate::migrations;

/// Convert a tokio-rusqlite error into `FlatmateError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> FlatmateError {
    FlatmateError::storage(e)
}

/// An open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, FlatmateError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(FlatmateError::storage)?;
            }
        }

        // refinery needs a plain rusqlite connection; migrate on a blocking
        // thread before handing the file to the async connection.
        let owned = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), FlatmateError> {
            let mut conn = rusqlite::Connection::open(&owned).map_err(FlatmateError::storage)?;
            apply_pragmas(&conn).map_err(FlatmateError::storage)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| FlatmateError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(FlatmateError::storage)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> { apply_pragmas(conn) })
            .await
            .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The async connection all queries go through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), FlatmateError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

fn apply_pragmas(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;")?;
    Ok(())
}
