// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`DocumentStore`] trait.

use async_trait::async_trait;
use rusqlite::{params, Connection, TransactionBehavior};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use flatmate_core::{DocumentStore, FlatmateError, StorePath};

use crate::database::{map_tr_err, Database};
use crate::push_id::PushIdGenerator;
use crate::tree::{self, LeafTable};

/// SQLite-backed document store.
///
/// The database is opened lazily on first use, so constructing a store is
/// cheap and never fails.
pub struct SqliteStore {
    path: String,
    db: OnceCell<Database>,
    ids: PushIdGenerator,
}

impl SqliteStore {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            db: OnceCell::new(),
            ids: PushIdGenerator::new(),
        }
    }

    /// Open the database now instead of on first use.
    pub async fn open(path: impl Into<String>) -> Result<Self, FlatmateError> {
        let store = Self::new(path);
        store.db().await?;
        Ok(store)
    }

    async fn db(&self) -> Result<&Database, FlatmateError> {
        self.db
            .get_or_try_init(|| async {
                let db = Database::open(&self.path).await?;
                debug!(path = %self.path, "SQLite document store initialized");
                Ok(db)
            })
            .await
    }

    /// Checkpoint the WAL if the database was ever opened.
    pub async fn close(&self) -> Result<(), FlatmateError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
        }
        Ok(())
    }
}

/// Leaf table view over a connection or open transaction.
struct SqliteLeaves<'a> {
    conn: &'a Connection,
}

impl LeafTable for SqliteLeaves<'_> {
    type Error = rusqlite::Error;

    fn read_subtree(&self, key: &str) -> Result<Vec<(String, String)>, rusqlite::Error> {
        let row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, String)> {
            Ok((row.get(0)?, row.get(1)?))
        };
        if key.is_empty() {
            let mut stmt = self
                .conn
                .prepare_cached("SELECT path, value FROM nodes ORDER BY path")?;
            let rows = stmt.query_map([], row)?.collect::<Result<Vec<_>, _>>()?;
            return Ok(rows);
        }
        let (lo, hi) = tree::descendant_range(key);
        let mut stmt = self.conn.prepare_cached(
            "SELECT path, value FROM nodes
             WHERE path = ?1 OR (path >= ?2 AND path < ?3)
             ORDER BY path",
        )?;
        let rows = stmt
            .query_map(params![key, lo, hi], row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn delete_subtree(&mut self, key: &str) -> Result<(), rusqlite::Error> {
        if key.is_empty() {
            self.conn.execute("DELETE FROM nodes", [])?;
            return Ok(());
        }
        let (lo, hi) = tree::descendant_range(key);
        self.conn.execute(
            "DELETE FROM nodes WHERE path = ?1 OR (path >= ?2 AND path < ?3)",
            params![key, lo, hi],
        )?;
        Ok(())
    }

    fn delete_leaf(&mut self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM nodes WHERE path = ?1", params![key])?;
        Ok(())
    }

    fn insert_leaf(&mut self, key: &str, json: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO nodes (path, value) VALUES (?1, ?2)",
            params![key, json],
        )?;
        Ok(())
    }
}

/// Surface a corrupt stored value as a rusqlite conversion failure.
fn decode_err(e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, FlatmateError> {
        let path = path.clone();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<Option<Value>, rusqlite::Error> {
                let leaves = SqliteLeaves { conn };
                tree::read(&leaves, &path)?.map_err(decode_err)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), FlatmateError> {
        self.multi_update(vec![(path.clone(), value)]).await
    }

    async fn multi_update(&self, updates: Vec<(StorePath, Value)>) -> Result<(), FlatmateError> {
        let prepared = tree::prepare(updates)?;
        if prepared.is_empty() {
            return Ok(());
        }
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                tree::apply_all(&mut SqliteLeaves { conn: &tx }, &prepared)?;
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn guarded_update(
        &self,
        guard: &StorePath,
        expected: Option<Value>,
        updates: Vec<(StorePath, Value)>,
    ) -> Result<bool, FlatmateError> {
        let prepared = tree::prepare(updates)?;
        let guard = guard.clone();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let mut leaves = SqliteLeaves { conn: &tx };
                if !tree::guard_holds(&leaves, &guard, &expected)?.map_err(decode_err)? {
                    return Ok(false);
                }
                tree::apply_all(&mut leaves, &prepared)?;
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(map_tr_err)
    }

    fn push_key(&self) -> String {
        self.ids.next()
    }
}
