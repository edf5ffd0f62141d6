//! SQLite catalog connection
//!
//! Follows the same pattern as the observation storage: one owned
//! `Connection`, opened once, with an escape hatch for components that need
//! the raw handle.

use rusqlite::Connection;
use std::time::{Duration, Instant};

use super::config::DatabaseConfig;
use crate::catalog::DATASET_SIZE_SQL;
use crate::error::{BenchError, Result};

/// VM instructions between deadline checks while a query runs
const PROGRESS_OPS: i32 = 1_000;

/// Connection to the catalog store
pub struct CatalogDb {
    conn: Connection,
    target: String,
    query_timeout: Option<Duration>,
}

impl std::fmt::Debug for CatalogDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDb")
            .field("target", &self.target)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl CatalogDb {
    /// Open the store described by `config`
    ///
    /// This is the only fatal failure point of a benchmark session.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.path)
        }
        .map_err(|source| BenchError::Connection {
            target: config.path.clone(),
            source,
        })?;

        conn.busy_timeout(config.busy_timeout())
            .map_err(|source| BenchError::Connection {
                target: config.path.clone(),
                source,
            })?;

        tracing::debug!(db = %config.path, "opened catalog connection");

        Ok(Self {
            conn,
            target: config.path.clone(),
            query_timeout: config.query_timeout(),
        })
    }

    /// Create an in-memory database for testing
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&DatabaseConfig::in_memory())
    }

    /// Path (or `:memory:`) this connection was opened on
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Number of catalog rows
    pub fn dataset_size(&self) -> rusqlite::Result<i64> {
        self.conn.query_row(DATASET_SIZE_SQL, [], |row| row.get(0))
    }

    /// Run `f` under the configured per-query deadline
    ///
    /// Past the deadline SQLite interrupts the running statement, which then
    /// fails with `SQLITE_INTERRUPT`.
    pub fn with_query_deadline<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let Some(timeout) = self.query_timeout else {
            return f(&self.conn);
        };

        let deadline = Instant::now() + timeout;
        self.conn
            .progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
        let out = f(&self.conn);
        self.conn.progress_handler(PROGRESS_OPS, None::<fn() -> bool>);
        out
    }

    /// Get reference to underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get mutable reference to underlying connection (for transactions)
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Close the connection, surfacing any error SQLite reports
    pub fn close(self) -> Result<()> {
        let target = self.target;
        self.conn
            .close()
            .map_err(|(_, source)| BenchError::Connection { target, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG_DDL;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_dataset_size() -> anyhow::Result<()> {
        let db = CatalogDb::open_in_memory()?;
        db.connection().execute_batch(CATALOG_DDL)?;
        db.connection().execute(
            "INSERT INTO products (id, name, description) VALUES (?1, ?2, ?3)",
            rusqlite::params![1, "Computer", "desktop"],
        )?;

        assert_eq!(db.dataset_size()?, 1);
        assert_eq!(db.target(), ":memory:");
        Ok(())
    }

    #[test]
    fn test_dataset_size_without_catalog_fails() -> anyhow::Result<()> {
        let db = CatalogDb::open_in_memory()?;
        assert!(db.dataset_size().is_err());
        Ok(())
    }

    #[test]
    fn test_open_unreachable_path_is_connection_error() {
        let config = DatabaseConfig::file("/nonexistent-dir/sub/catalog.db");
        let err = CatalogDb::open(&config).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_query_deadline_interrupts_long_query() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("slow.db");
        let mut config = DatabaseConfig::file(path.to_string_lossy());
        config.query_timeout_ms = Some(10);
        let db = CatalogDb::open(&config)?;

        let result = db.with_query_deadline(|conn| {
            conn.query_row(
                "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n)
                 SELECT COUNT(*) FROM n",
                [],
                |row| row.get::<_, i64>(0),
            )
        });
        assert!(result.is_err());

        // Handler is cleared afterwards
        let one: i64 = db
            .with_query_deadline(|conn| conn.query_row("SELECT 1", [], |row| row.get(0)))?;
        assert_eq!(one, 1);
        Ok(())
    }
}
