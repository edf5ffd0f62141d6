//! Timed execution of one search method for one term
//!
//! The term is always bound to the method's `?1` slot, never spliced into
//! the SQL text. Timing covers statement execution and full materialization
//! of the result ids, not statement preparation.

use rusqlite::params;
use std::time::Instant;

use crate::catalog::IdSet;
use crate::db::CatalogDb;
use crate::error::BenchError;
use crate::methods::SearchMethod;

/// Outcome of one method run
///
/// A failed run has zero duration, no results, and carries the error so the
/// caller can record the trial as failed instead of aborting.
#[derive(Debug)]
pub struct Execution {
    pub duration_ms: f64,
    pub result_ids: IdSet,
    pub error: Option<BenchError>,
}

impl Execution {
    fn failed(error: BenchError) -> Self {
        Self {
            duration_ms: 0.0,
            result_ids: IdSet::new(),
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn result_count(&self) -> usize {
        self.result_ids.len()
    }
}

/// Runs search methods against the catalog store
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `method` for `term`; errors are captured in the returned outcome
    pub fn execute(&self, db: &CatalogDb, method: &SearchMethod, term: &str) -> Execution {
        match self.try_execute(db, method, term) {
            Ok((duration_ms, result_ids)) => Execution {
                duration_ms,
                result_ids,
                error: None,
            },
            Err(source) => {
                let error = BenchError::QueryExecution {
                    method: method.name.clone(),
                    term: term.to_string(),
                    source,
                };
                tracing::debug!(method = %method.name, term, error = %error, "query failed");
                Execution::failed(error)
            }
        }
    }

    fn try_execute(
        &self,
        db: &CatalogDb,
        method: &SearchMethod,
        term: &str,
    ) -> rusqlite::Result<(f64, IdSet)> {
        let mut stmt = db.connection().prepare_cached(&method.query)?;

        db.with_query_deadline(|_| {
            let start = Instant::now();
            let mut ids = IdSet::new();
            let mut rows = stmt.query(params![term])?;
            while let Some(row) = rows.next()? {
                ids.insert(row.get(0)?);
            }
            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
            Ok((duration_ms, ids))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG_DDL;
    use crate::db::DatabaseConfig;

    fn catalog() -> anyhow::Result<CatalogDb> {
        let db = CatalogDb::open_in_memory()?;
        db.connection().execute_batch(CATALOG_DDL)?;
        db.connection().execute_batch(
            "INSERT INTO products (id, name, description) VALUES
                (1, 'Computer Nova', 'desk'),
                (2, 'Computer Terra', 'desk'),
                (3, 'Monitor', 'screen');",
        )?;
        Ok(db)
    }

    #[test]
    fn test_collects_ids_and_times_query() -> anyhow::Result<()> {
        let db = catalog()?;
        let method = SearchMethod::new(
            "ILIKE",
            "SELECT id FROM products WHERE name LIKE '%' || ?1 || '%'",
            false,
        );

        let execution = QueryExecutor::new().execute(&db, &method, "computer");
        assert!(execution.succeeded());
        assert_eq!(execution.result_ids, IdSet::from([1, 2]));
        assert_eq!(execution.result_count(), 2);
        assert!(execution.duration_ms >= 0.0);
        Ok(())
    }

    #[test]
    fn test_duplicate_rows_count_once() -> anyhow::Result<()> {
        let db = catalog()?;
        let method = SearchMethod::new(
            "Dup",
            "SELECT id FROM products WHERE name LIKE ?1 || '%'
             UNION ALL
             SELECT id FROM products WHERE name LIKE ?1 || '%'",
            false,
        );

        let execution = QueryExecutor::new().execute(&db, &method, "computer");
        assert_eq!(execution.result_count(), 2);
        Ok(())
    }

    #[test]
    fn test_term_is_bound_not_spliced() -> anyhow::Result<()> {
        let db = catalog()?;
        let method = SearchMethod::new("Exact", "SELECT id FROM products WHERE name = ?1", false);

        let execution =
            QueryExecutor::new().execute(&db, &method, "x' OR '1'='1");
        assert!(execution.succeeded());
        assert!(execution.result_ids.is_empty());
        Ok(())
    }

    #[test]
    fn test_malformed_query_is_captured() -> anyhow::Result<()> {
        let db = catalog()?;
        let method = SearchMethod::new("Broken", "SELEC id FROM products WHERE ?1", false);

        let execution = QueryExecutor::new().execute(&db, &method, "computer");
        assert!(!execution.succeeded());
        assert_eq!(execution.duration_ms, 0.0);
        assert!(execution.result_ids.is_empty());
        assert!(matches!(
            execution.error,
            Some(BenchError::QueryExecution { ref method, .. }) if method == "Broken"
        ));
        Ok(())
    }

    #[test]
    fn test_timed_out_query_is_failed_trial() -> anyhow::Result<()> {
        let mut config = DatabaseConfig::in_memory();
        config.query_timeout_ms = Some(10);
        let db = CatalogDb::open(&config)?;
        let method = SearchMethod::new(
            "Endless",
            "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n)
             SELECT x FROM n WHERE x < 0 AND ?1 IS NOT NULL",
            false,
        );

        let execution = QueryExecutor::new().execute(&db, &method, "computer");
        assert!(!execution.succeeded());
        assert_eq!(execution.duration_ms, 0.0);
        assert!(execution.result_ids.is_empty());
        assert!(matches!(
            execution.error,
            Some(BenchError::QueryExecution { ref method, .. }) if method == "Endless"
        ));
        Ok(())
    }

    #[test]
    fn test_missing_function_is_captured() -> anyhow::Result<()> {
        let db = catalog()?;
        // fuzzy functions are not registered on this connection
        let method = SearchMethod::new(
            "Levenshtein",
            "SELECT id FROM products WHERE levenshtein(name, ?1) <= 3",
            false,
        );

        let execution = QueryExecutor::new().execute(&db, &method, "Monitr");
        assert!(!execution.succeeded());
        Ok(())
    }
}
