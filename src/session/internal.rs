//! Internal implementation for the session module
//!
//! Per scenario: resolve the reference set once, then for each method run,
//! score and persist one trial. Each step has its own error boundary; only
//! the connection failure in `connect` ever stops a session.

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use super::{CancelFlag, SessionReport, SkippedScenario, TrialRecord};
use crate::db::{CatalogDb, DatabaseConfig};
use crate::error::{BenchError, Result};
use crate::executor::QueryExecutor;
use crate::methods::{MethodCatalog, SearchMethod};
use crate::metrics;
use crate::prepare::{EnvironmentPreparer, PreparationReport, StepStatus};
use crate::reference::{ReferenceResolver, ScenarioReference};
use crate::scenario::TestScenario;
use crate::storage::{Observation, ObservationStore};

/// What happened to one scenario
#[derive(Debug)]
pub(super) enum ScenarioOutcome {
    Trials(Vec<TrialRecord>),
    Skipped(SkippedScenario),
    Cancelled,
}

/// Resolve the reference set, then run every method for the typo term
pub(super) fn run_scenario(
    db: &CatalogDb,
    catalog: &MethodCatalog,
    session_id: &str,
    scenario: &TestScenario,
) -> ScenarioOutcome {
    let reference = match ReferenceResolver::new().resolve_scenario(db, &scenario.correct) {
        Ok(reference) => reference,
        Err(e) => {
            tracing::warn!(
                correct = %scenario.correct,
                category = %scenario.category,
                error = %e,
                "skipping scenario: reference set unavailable"
            );
            return ScenarioOutcome::Skipped(SkippedScenario {
                scenario: scenario.clone(),
                reason: e.to_string(),
            });
        }
    };

    if reference.relevant.is_empty() {
        tracing::warn!(
            correct = %scenario.correct,
            category = %scenario.category,
            "skipping scenario: no reference items"
        );
        return ScenarioOutcome::Skipped(SkippedScenario {
            scenario: scenario.clone(),
            reason: format!("no reference items for '{}'", scenario.correct),
        });
    }

    tracing::debug!(
        correct = %scenario.correct,
        relevant = reference.relevant.len(),
        dataset_size = reference.dataset_size,
        "reference set resolved"
    );

    let store = ObservationStore::new(db.connection());
    let trials = catalog
        .iter()
        .map(|method| run_trial(db, &store, session_id, method, scenario, &reference))
        .collect();
    ScenarioOutcome::Trials(trials)
}

fn run_trial(
    db: &CatalogDb,
    store: &ObservationStore<'_>,
    session_id: &str,
    method: &SearchMethod,
    scenario: &TestScenario,
    reference: &ScenarioReference,
) -> TrialRecord {
    let execution = QueryExecutor::new().execute(db, method, &scenario.typo);
    let scores = metrics::score(&execution.result_ids, &reference.relevant);
    let succeeded = execution.succeeded();
    let mut error = execution.error.as_ref().map(BenchError::to_string);

    if let Some(e) = &execution.error {
        tracing::warn!(
            method = %method.name,
            term = %scenario.typo,
            category = %scenario.category,
            error = %e,
            "query failed; recording zero-result trial"
        );
    }

    let observation = Observation {
        session_id: session_id.to_string(),
        method: method.name.clone(),
        dataset_size: reference.dataset_size,
        query_text: scenario.typo.clone(),
        execution_time_ms: execution.duration_ms,
        result_count: execution.result_count() as i64,
        index_used: method.uses_index,
        correct_term: scenario.correct.clone(),
        error_category: scenario.category.clone(),
        scores,
        succeeded,
        recorded_at: Utc::now(),
    };

    let persisted = match store.append(&observation) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                method = %method.name,
                term = %scenario.typo,
                category = %scenario.category,
                error = %e,
                "observation not written"
            );
            error.get_or_insert_with(|| e.to_string());
            false
        }
    };

    tracing::info!(
        method = %method.name,
        term = %scenario.typo,
        time_ms = format_args!("{:.1}", execution.duration_ms),
        results = execution.result_count(),
        precision = format_args!("{:.2}", scores.precision),
        recall = format_args!("{:.2}", scores.recall),
        f1 = format_args!("{:.2}", scores.f1),
        "trial"
    );

    TrialRecord {
        method: method.name.clone(),
        scenario: scenario.clone(),
        dataset_size: reference.dataset_size,
        duration_ms: execution.duration_ms,
        result_count: execution.result_count(),
        index_used: method.uses_index,
        scores,
        succeeded,
        persisted,
        error,
    }
}

/// Open a worker connection with the fuzzy functions registered
///
/// The search index and observation table were created by the session's
/// own preparation, so only the connection-scoped step is repeated here.
fn open_worker(config: &DatabaseConfig) -> Result<CatalogDb> {
    let db = CatalogDb::open(config)?;
    if let Err(e) = EnvironmentPreparer::new().ensure_extensions(&db) {
        tracing::warn!(error = %e, "worker connection without fuzzy functions");
    }
    Ok(db)
}

/// Fan scenarios out over a rayon pool, one connection per worker
pub(super) fn run_scenarios_parallel(
    config: &DatabaseConfig,
    catalog: &MethodCatalog,
    session_id: &str,
    scenarios: &[TestScenario],
    workers: usize,
    cancel: &CancelFlag,
) -> Result<Vec<ScenarioOutcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| BenchError::Config(format!("failed to start {workers} workers: {e}")))?;

    tracing::info!(workers, scenarios = scenarios.len(), "running scenarios in parallel");

    let outcomes = pool.install(|| {
        scenarios
            .par_iter()
            .map_init(
                || open_worker(config),
                |worker, scenario| {
                    if cancel.is_cancelled() {
                        return ScenarioOutcome::Cancelled;
                    }
                    match worker {
                        Ok(db) => run_scenario(db, catalog, session_id, scenario),
                        Err(e) => {
                            tracing::warn!(
                                correct = %scenario.correct,
                                error = %e,
                                "skipping scenario: worker has no connection"
                            );
                            ScenarioOutcome::Skipped(SkippedScenario {
                                scenario: scenario.clone(),
                                reason: e.to_string(),
                            })
                        }
                    }
                },
            )
            .collect::<Vec<_>>()
    });

    Ok(outcomes)
}

pub(super) fn assemble_report(
    session_id: &str,
    started_at: DateTime<Utc>,
    preparation: PreparationReport,
    sink: StepStatus,
    outcomes: Vec<ScenarioOutcome>,
) -> SessionReport {
    let mut trials = Vec::new();
    let mut skipped = Vec::new();
    let mut cancelled = false;

    for outcome in outcomes {
        match outcome {
            ScenarioOutcome::Trials(t) => trials.extend(t),
            ScenarioOutcome::Skipped(s) => skipped.push(s),
            ScenarioOutcome::Cancelled => cancelled = true,
        }
    }
    if cancelled {
        tracing::info!(session = %session_id, "run cancelled at scenario boundary");
    }

    SessionReport {
        session_id: session_id.to_string(),
        started_at,
        finished_at: Utc::now(),
        preparation,
        sink,
        trials,
        skipped,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG_DDL;
    use crate::storage::ObservationFilter;

    fn prepared_catalog() -> anyhow::Result<CatalogDb> {
        let mut db = CatalogDb::open_in_memory()?;
        db.connection().execute_batch(CATALOG_DDL)?;
        db.connection().execute_batch(
            "INSERT INTO products (id, name, description) VALUES
                (101, 'CircuitInnovate Computer Nova', 'desktop'),
                (202, 'TitanActive Workstation', 'fast computer'),
                (303, 'Gaming Mouse', 'wireless');",
        )?;
        EnvironmentPreparer::new().prepare(&mut db);
        ObservationStore::new(db.connection()).init_schema()?;
        Ok(db)
    }

    fn two_methods() -> anyhow::Result<MethodCatalog> {
        Ok(MethodCatalog::builder()
            .register(SearchMethod::new(
                "Name",
                "SELECT id FROM products WHERE name LIKE '%' || ?1 || '%'",
                false,
            ))?
            .register(SearchMethod::new(
                "Broken",
                "SELECT id FROM no_such_table WHERE name = ?1",
                false,
            ))?
            .build())
    }

    #[test]
    fn test_scenario_runs_every_method() -> anyhow::Result<()> {
        let db = prepared_catalog()?;
        let scenario = TestScenario::new("computer", "computer", "exact");

        let ScenarioOutcome::Trials(trials) = run_scenario(&db, &two_methods()?, "s1", &scenario)
        else {
            panic!("scenario should not be skipped");
        };

        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].method, "Name");
        assert!(trials[0].succeeded && trials[0].persisted);
        assert_eq!(trials[0].scores.precision, 1.0);
        assert_eq!(trials[0].scores.recall, 0.5);
        assert_eq!(trials[0].dataset_size, 3);

        assert!(!trials[1].succeeded);
        assert!(trials[1].persisted);
        assert!(trials[1].error.is_some());
        assert_eq!(trials[1].scores.f1, 0.0);

        let store = ObservationStore::new(db.connection());
        assert_eq!(store.count(&ObservationFilter::default().session("s1"))?, 2);
        Ok(())
    }

    #[test]
    fn test_empty_reference_skips_without_observations() -> anyhow::Result<()> {
        let db = prepared_catalog()?;
        let scenario = TestScenario::new("keyboard", "keybord", "omission");

        let outcome = run_scenario(&db, &two_methods()?, "s1", &scenario);
        assert!(matches!(outcome, ScenarioOutcome::Skipped(ref s) if s.reason.contains("keyboard")));

        let store = ObservationStore::new(db.connection());
        assert_eq!(store.count(&ObservationFilter::default())?, 0);
        Ok(())
    }

    #[test]
    fn test_resolution_failure_skips_only_that_scenario() -> anyhow::Result<()> {
        let mut db = CatalogDb::open_in_memory()?;
        EnvironmentPreparer::new().prepare(&mut db);
        ObservationStore::new(db.connection()).init_schema()?;
        let catalog = two_methods()?;

        // No catalog table yet: the reference query cannot run
        let first = TestScenario::new("computer", "copmuter", "transposition");
        let outcome = run_scenario(&db, &catalog, "s1", &first);
        let ScenarioOutcome::Skipped(skipped) = outcome else {
            panic!("scenario should be skipped");
        };
        assert_eq!(skipped.scenario, first);
        assert!(skipped.reason.contains("Reference resolution failed for 'computer'"));

        db.connection().execute_batch(CATALOG_DDL)?;
        db.connection()
            .execute("INSERT INTO products (id, name) VALUES (1, 'Gaming Mouse')", [])?;
        let second = TestScenario::new("mouse", "mouce", "substitution");
        let ScenarioOutcome::Trials(trials) = run_scenario(&db, &catalog, "s1", &second) else {
            panic!("second scenario should run");
        };
        assert_eq!(trials.len(), 2);

        let observations = ObservationStore::new(db.connection())
            .list(&ObservationFilter::default().session("s1"))?;
        assert_eq!(observations.len(), 2);
        assert!(observations.iter().all(|o| o.correct_term == "mouse"));
        Ok(())
    }

    #[test]
    fn test_missing_sink_marks_trials_unpersisted() -> anyhow::Result<()> {
        let mut db = CatalogDb::open_in_memory()?;
        db.connection().execute_batch(CATALOG_DDL)?;
        db.connection()
            .execute("INSERT INTO products (id, name) VALUES (1, 'Mouse')", [])?;
        EnvironmentPreparer::new().prepare(&mut db);
        let scenario = TestScenario::new("mouse", "mouse", "exact");

        let ScenarioOutcome::Trials(trials) = run_scenario(&db, &two_methods()?, "s1", &scenario)
        else {
            panic!("scenario should not be skipped");
        };
        assert!(trials.iter().all(|t| !t.persisted && t.is_failed()));
        assert!(trials[0].succeeded);
        Ok(())
    }

    #[test]
    fn test_assemble_report_keeps_order_and_flags_cancel() {
        let trial = |method: &str| TrialRecord {
            method: method.to_string(),
            scenario: TestScenario::new("a", "b", "c"),
            dataset_size: 10,
            duration_ms: 1.0,
            result_count: 1,
            index_used: false,
            scores: metrics::Scores::uniform(1.0),
            succeeded: true,
            persisted: true,
            error: None,
        };
        let ready = StepStatus::Ready;
        let report = assemble_report(
            "s1",
            Utc::now(),
            PreparationReport {
                extensions: ready.clone(),
                search_index: ready.clone(),
            },
            ready,
            vec![
                ScenarioOutcome::Trials(vec![trial("x"), trial("y")]),
                ScenarioOutcome::Skipped(SkippedScenario {
                    scenario: TestScenario::new("d", "e", "f"),
                    reason: "none".to_string(),
                }),
                ScenarioOutcome::Trials(vec![trial("z")]),
                ScenarioOutcome::Cancelled,
            ],
        );

        let methods: Vec<&str> = report.trials.iter().map(|t| t.method.as_str()).collect();
        assert_eq!(methods, vec!["x", "y", "z"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.cancelled);
        assert_eq!(report.observations_written(), 3);
        assert_eq!(report.dataset_size(), Some(10));
    }
}
