//! Observation storage on the catalog store
//!
//! SQLite is the source of truth for benchmark observations. The store
//! borrows the session's connection; it never opens its own.

use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;

use crate::error::{BenchError, Result};
use crate::metrics::Scores;
use crate::storage::types::{Observation, ObservationFilter, PerformanceSummary, QualitySummary};

const SELECT_COLUMNS: &str = "
    SELECT test_run_id, method, dataset_size, query_text, execution_time_ms,
           result_count, index_used, correct_term, error_category,
           precision, recall, f1_score, succeeded, recorded_at
    FROM search_benchmarks";

const FILTER_CLAUSE: &str = "
    WHERE (?1 IS NULL OR test_run_id = ?1)
      AND (?2 IS NULL OR method = ?2)";

/// Append-only sink of benchmark observations
pub struct ObservationStore<'a> {
    db: &'a Connection,
}

impl<'a> ObservationStore<'a> {
    pub fn new(db: &'a Connection) -> Self {
        Self { db }
    }

    /// Create the `search_benchmarks` table if it does not exist
    pub fn init_schema(&self) -> rusqlite::Result<()> {
        self.db.execute_batch(
            "CREATE TABLE IF NOT EXISTS search_benchmarks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_run_id TEXT NOT NULL,
                method TEXT NOT NULL,
                dataset_size INTEGER NOT NULL,
                query_text TEXT NOT NULL,
                execution_time_ms REAL NOT NULL CHECK (execution_time_ms >= 0),
                result_count INTEGER NOT NULL CHECK (result_count >= 0),
                index_used INTEGER NOT NULL,
                correct_term TEXT NOT NULL,
                error_category TEXT NOT NULL,
                precision REAL NOT NULL,
                recall REAL NOT NULL,
                f1_score REAL NOT NULL,
                succeeded INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_search_benchmarks_trace
                ON search_benchmarks(test_run_id, method, query_text);",
        )
    }

    /// Whether `search_benchmarks` exists yet
    pub fn has_schema(&self) -> rusqlite::Result<bool> {
        self.db.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'search_benchmarks')",
            [],
            |row| row.get(0),
        )
    }

    /// Persist one observation as a single row
    ///
    /// Observations are immutable once written; a failed insert leaves no
    /// partial row behind.
    pub fn append(&self, observation: &Observation) -> Result<()> {
        self.db
            .execute(
                "INSERT INTO search_benchmarks (
                    test_run_id, method, dataset_size, query_text, execution_time_ms,
                    result_count, index_used, correct_term, error_category,
                    precision, recall, f1_score, succeeded, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    observation.session_id,
                    observation.method,
                    observation.dataset_size,
                    observation.query_text,
                    observation.execution_time_ms,
                    observation.result_count,
                    observation.index_used,
                    observation.correct_term,
                    observation.error_category,
                    observation.scores.precision,
                    observation.scores.recall,
                    observation.scores.f1,
                    observation.succeeded,
                    observation.recorded_at,
                ],
            )
            .map(|_| ())
            .map_err(|source| BenchError::ObservationWrite {
                method: observation.method.clone(),
                term: observation.query_text.clone(),
                source,
            })
    }

    /// Observations matching `filter`, in insertion order
    pub fn list(&self, filter: &ObservationFilter) -> rusqlite::Result<Vec<Observation>> {
        let sql = format!("{SELECT_COLUMNS} {FILTER_CLAUSE} ORDER BY id");
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map(params![filter.session_id, filter.method], observation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Count of observations matching `filter`
    pub fn count(&self, filter: &ObservationFilter) -> rusqlite::Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM search_benchmarks {FILTER_CLAUSE}");
        let count: i64 = self.db.query_row(
            &sql,
            params![filter.session_id, filter.method],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Mean/median latency, mean result count and index usage per
    /// (method, dataset size)
    pub fn performance_summary(
        &self,
        filter: &ObservationFilter,
    ) -> rusqlite::Result<Vec<PerformanceSummary>> {
        let mut groups: BTreeMap<(String, i64), Vec<Observation>> = BTreeMap::new();
        for observation in self.list(filter)? {
            groups
                .entry((observation.method.clone(), observation.dataset_size))
                .or_default()
                .push(observation);
        }

        let summaries = groups
            .into_iter()
            .map(|((method, dataset_size), rows)| {
                let trials = rows.len();
                let mut times: Vec<f64> = rows.iter().map(|o| o.execution_time_ms).collect();
                let indexed = rows.iter().filter(|o| o.index_used).count();
                let results: i64 = rows.iter().map(|o| o.result_count).sum();

                PerformanceSummary {
                    method,
                    dataset_size,
                    trials,
                    avg_time_ms: times.iter().sum::<f64>() / trials as f64,
                    median_time_ms: median(&mut times),
                    avg_results: results as f64 / trials as f64,
                    index_usage_pct: indexed as f64 * 100.0 / trials as f64,
                }
            })
            .collect();

        Ok(summaries)
    }

    /// Mean precision/recall/F1 per (error category, method)
    pub fn quality_by_category(
        &self,
        filter: &ObservationFilter,
    ) -> rusqlite::Result<Vec<QualitySummary>> {
        let sql = format!(
            "SELECT error_category, method, COUNT(*), AVG(precision), AVG(recall), AVG(f1_score)
             FROM search_benchmarks {FILTER_CLAUSE}
             GROUP BY error_category, method
             ORDER BY error_category, method"
        );
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map(params![filter.session_id, filter.method], |row| {
                Ok(QualitySummary {
                    error_category: row.get(0)?,
                    method: row.get(1)?,
                    trials: row.get::<_, i64>(2)? as usize,
                    precision: row.get(3)?,
                    recall: row.get(4)?,
                    f1: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn observation_from_row(row: &Row<'_>) -> rusqlite::Result<Observation> {
    Ok(Observation {
        session_id: row.get(0)?,
        method: row.get(1)?,
        dataset_size: row.get(2)?,
        query_text: row.get(3)?,
        execution_time_ms: row.get(4)?,
        result_count: row.get(5)?,
        index_used: row.get(6)?,
        correct_term: row.get(7)?,
        error_category: row.get(8)?,
        scores: Scores {
            precision: row.get(9)?,
            recall: row.get(10)?,
            f1: row.get(11)?,
        },
        succeeded: row.get(12)?,
        recorded_at: row.get(13)?,
    })
}

/// Median with linear interpolation between the two middle values
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
