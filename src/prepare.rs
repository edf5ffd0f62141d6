//! Environment preparation
//!
//! Two steps run before any timed trial, each idempotent and each in its own
//! error boundary:
//!
//! 1. **extensions** - register the fuzzy SQL functions on the connection and
//!    check that FTS5 is compiled in
//! 2. **search index** - create `products_fts` if missing and rebuild it from
//!    the current name and description of every catalog row
//!
//! A failed step is logged and reported; the session carries on and methods
//! needing the missing capability fail at query time.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::CatalogDb;
use crate::error::{BenchError, Result};
use crate::fuzzy;

const FTS5_PROBE_SQL: &str = "
    CREATE VIRTUAL TABLE IF NOT EXISTS temp.fuzzbench_fts5_check USING fts5(x);
    DROP TABLE temp.fuzzbench_fts5_check;";

const SEARCH_INDEX_SQL: &str = "
    CREATE VIRTUAL TABLE IF NOT EXISTS products_fts USING fts5(
        name,
        description,
        content='products',
        content_rowid='id',
        tokenize='porter unicode61'
    );
    INSERT INTO products_fts(products_fts) VALUES('rebuild');";

/// Result of one preparation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "error")]
pub enum StepStatus {
    Ready,
    Failed(String),
}

impl StepStatus {
    fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Ready,
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Status of both preparation steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparationReport {
    pub extensions: StepStatus,
    pub search_index: StepStatus,
}

impl PreparationReport {
    pub fn is_complete(&self) -> bool {
        self.extensions.is_ready() && self.search_index.is_ready()
    }
}

/// Idempotently readies a catalog store for benchmarking
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentPreparer;

impl EnvironmentPreparer {
    pub fn new() -> Self {
        Self
    }

    /// Run both steps; failures are logged and reported, never raised
    pub fn prepare(&self, db: &mut CatalogDb) -> PreparationReport {
        let extensions = self.ensure_extensions(db);
        if let Err(e) = &extensions {
            tracing::warn!(step = "extensions", error = %e, "preparation step failed");
        }

        let search_index = self.ensure_search_index(db);
        if let Err(e) = &search_index {
            tracing::warn!(step = "search_index", error = %e, "preparation step failed");
        }

        let report = PreparationReport {
            extensions: StepStatus::from_result(extensions),
            search_index: StepStatus::from_result(search_index),
        };
        tracing::info!(
            target_db = db.target(),
            complete = report.is_complete(),
            "environment prepared"
        );
        report
    }

    /// Step 1: fuzzy functions registered and FTS5 available
    ///
    /// Functions live on the connection, so every new connection (for
    /// instance a parallel worker's) needs this step again.
    pub fn ensure_extensions(&self, db: &CatalogDb) -> Result<()> {
        let wrap = |source| BenchError::Preparation {
            step: "extensions",
            source,
        };

        register_fuzzy_functions(db.connection()).map_err(wrap)?;
        db.connection().execute_batch(FTS5_PROBE_SQL).map_err(wrap)?;
        Ok(())
    }

    /// Step 2: full-text index rebuilt from every catalog row
    ///
    /// Runs in one transaction; a failure rolls back to the previous index.
    pub fn ensure_search_index(&self, db: &mut CatalogDb) -> Result<()> {
        let wrap = |source| BenchError::Preparation {
            step: "search_index",
            source,
        };

        let tx = db.connection_mut().transaction().map_err(wrap)?;
        tx.execute_batch(SEARCH_INDEX_SQL).map_err(wrap)?;
        tx.commit().map_err(wrap)?;
        Ok(())
    }
}

/// Register `fold`, `levenshtein`, `soundex`, `metaphone` and `similarity`
///
/// `fold(s)` lowercases with full Unicode case mapping; SQLite's own
/// `lower()` and `LIKE` only fold ASCII.
///
/// Re-registering replaces the previous definition, so this is safe to
/// repeat. NULL arguments yield NULL.
pub fn register_fuzzy_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("fold", 1, flags, |ctx| {
        let s: Option<String> = ctx.get(0)?;
        Ok(s.map(|s| s.to_lowercase()))
    })?;

    conn.create_scalar_function("levenshtein", 2, flags, |ctx| {
        let a: Option<String> = ctx.get(0)?;
        let b: Option<String> = ctx.get(1)?;
        Ok(a.zip(b)
            .map(|(a, b)| fuzzy::levenshtein(&a, &b) as i64))
    })?;

    conn.create_scalar_function("soundex", 1, flags, |ctx| {
        let s: Option<String> = ctx.get(0)?;
        Ok(s.map(|s| fuzzy::soundex(&s)))
    })?;

    conn.create_scalar_function("metaphone", 2, flags, |ctx| {
        let s: Option<String> = ctx.get(0)?;
        let max_len: i64 = ctx.get(1)?;
        let max_len = usize::try_from(max_len).unwrap_or(0);
        Ok(s.map(|s| fuzzy::metaphone(&s, max_len)))
    })?;

    conn.create_scalar_function("similarity", 2, flags, |ctx| {
        let a: Option<String> = ctx.get(0)?;
        let b: Option<String> = ctx.get(1)?;
        Ok(a.zip(b)
            .map(|(a, b)| fuzzy::trigram_similarity(&a, &b)))
    })?;

    Ok(())
}
