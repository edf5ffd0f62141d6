//! Benchmark session - one run of every method against every scenario
//!
//! A session owns its catalog connection, a fresh session id and the frozen
//! method catalog. It moves through `Created → Prepared → Running →
//! Completed`; a completed session cannot run again.
//!
//! Public interface:
//! - [`BenchmarkSession`] - connect, prepare, run, close
//! - [`SessionReport`] / [`TrialRecord`] / [`SkippedScenario`] - what a run did
//! - [`CancelFlag`] - stop a run at the next scenario boundary
//! - [`execute`] - connect, run and close from a [`BenchConfig`]
//!
//! # Example
//!
//! ```no_run
//! use fuzzbench::{BenchmarkSession, DatabaseConfig, MethodCatalog, TestScenario};
//!
//! let mut session =
//!     BenchmarkSession::connect(&DatabaseConfig::file("catalog.db"), MethodCatalog::builtin())?;
//! let report = session.run(&[TestScenario::new("computer", "copmuter", "transposition")])?;
//! println!("{} observations written", report.observations_written());
//! session.close()?;
//! # Ok::<(), fuzzbench::BenchError>(())
//! ```

mod internal;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::BenchConfig;
use crate::db::{CatalogDb, DatabaseConfig};
use crate::error::{BenchError, Result};
use crate::methods::MethodCatalog;
use crate::metrics::Scores;
use crate::prepare::{EnvironmentPreparer, PreparationReport, StepStatus};
use crate::scenario::TestScenario;
use crate::storage::ObservationStore;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Created,
    Prepared,
    Running,
    Completed,
}

/// Shared flag checked between scenarios
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One (method, scenario) trial as the session saw it
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    pub method: String,
    pub scenario: TestScenario,
    pub dataset_size: i64,
    pub duration_ms: f64,
    pub result_count: usize,
    pub index_used: bool,
    #[serde(flatten)]
    pub scores: Scores,
    /// False when the query failed or timed out
    pub succeeded: bool,
    /// False when the observation could not be written
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrialRecord {
    pub fn is_failed(&self) -> bool {
        !self.succeeded || !self.persisted
    }
}

/// A scenario that produced no trials
#[derive(Debug, Clone, Serialize)]
pub struct SkippedScenario {
    pub scenario: TestScenario,
    pub reason: String,
}

/// Everything one run did, in scenario order
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub preparation: PreparationReport,
    /// Creation of the observation table
    pub sink: StepStatus,
    pub trials: Vec<TrialRecord>,
    pub skipped: Vec<SkippedScenario>,
    pub cancelled: bool,
}

impl SessionReport {
    pub fn observations_written(&self) -> usize {
        self.trials.iter().filter(|t| t.persisted).count()
    }

    pub fn failed_trials(&self) -> usize {
        self.trials.iter().filter(|t| t.is_failed()).count()
    }

    /// Catalog size seen by the first scenario that ran
    pub fn dataset_size(&self) -> Option<i64> {
        self.trials.first().map(|t| t.dataset_size)
    }
}

/// A benchmark run bound to one catalog connection
pub struct BenchmarkSession {
    db: Option<CatalogDb>,
    db_config: DatabaseConfig,
    catalog: MethodCatalog,
    session_id: String,
    started_at: DateTime<Utc>,
    state: SessionState,
    preparation: Option<(PreparationReport, StepStatus)>,
    cancel: CancelFlag,
}

impl BenchmarkSession {
    /// Open the catalog store and start a new session
    ///
    /// A connection failure here is the only fatal error of a session.
    pub fn connect(config: &DatabaseConfig, catalog: MethodCatalog) -> Result<Self> {
        let db = CatalogDb::open(config)?;
        let session_id = Uuid::new_v4().simple().to_string();
        tracing::info!(session = %session_id, db = %config.path, methods = catalog.len(), "session started");

        Ok(Self {
            db: Some(db),
            db_config: config.clone(),
            catalog,
            session_id,
            started_at: Utc::now(),
            state: SessionState::Created,
            preparation: None,
            cancel: CancelFlag::new(),
        })
    }

    /// Share `flag` with whoever may cancel this run
    pub fn with_cancellation(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn methods(&self) -> &MethodCatalog {
        &self.catalog
    }

    /// The session's catalog connection, until the session is closed
    pub fn db(&self) -> Option<&CatalogDb> {
        self.db.as_ref()
    }

    /// Ready the store: fuzzy functions, search index and observation table
    ///
    /// Runs once; later calls return the first report unchanged.
    pub fn prepare(&mut self) -> Result<PreparationReport> {
        if let Some((report, _)) = &self.preparation {
            return Ok(report.clone());
        }
        let db = self
            .db
            .as_mut()
            .ok_or_else(|| BenchError::InvalidState("session is closed".to_string()))?;

        let report = EnvironmentPreparer::new().prepare(db);
        let sink = match ObservationStore::new(db.connection()).init_schema() {
            Ok(()) => StepStatus::Ready,
            Err(e) => {
                tracing::warn!(step = "sink", error = %e, "observation table unavailable");
                StepStatus::Failed(e.to_string())
            }
        };

        self.preparation = Some((report.clone(), sink));
        if self.state == SessionState::Created {
            self.state = SessionState::Prepared;
        }
        Ok(report)
    }

    /// Run every method against every scenario on the session connection
    pub fn run(&mut self, scenarios: &[TestScenario]) -> Result<SessionReport> {
        self.begin_run()?;

        let db = self
            .db
            .as_ref()
            .ok_or_else(|| BenchError::InvalidState("session is closed".to_string()))?;
        let mut outcomes = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            if self.cancel.is_cancelled() {
                outcomes.push(internal::ScenarioOutcome::Cancelled);
                break;
            }
            outcomes.push(internal::run_scenario(
                db,
                &self.catalog,
                &self.session_id,
                scenario,
            ));
        }

        Ok(self.finish_run(outcomes))
    }

    /// Run scenarios across `workers` connections
    ///
    /// Falls back to [`Self::run`] for one worker or an in-memory store,
    /// which cannot be shared across connections. Trials are still reported
    /// in scenario order.
    pub fn run_parallel(
        &mut self,
        scenarios: &[TestScenario],
        workers: usize,
    ) -> Result<SessionReport> {
        if workers <= 1 || self.db_config.is_in_memory() {
            return self.run(scenarios);
        }
        self.begin_run()?;

        let outcomes = internal::run_scenarios_parallel(
            &self.db_config,
            &self.catalog,
            &self.session_id,
            scenarios,
            workers,
            &self.cancel,
        )?;

        Ok(self.finish_run(outcomes))
    }

    /// Release the connection, reporting any error from closing it
    pub fn close(mut self) -> Result<()> {
        match self.db.take() {
            Some(db) => {
                tracing::debug!(session = %self.session_id, "closing session connection");
                db.close()
            }
            None => Ok(()),
        }
    }

    fn begin_run(&mut self) -> Result<()> {
        match self.state {
            SessionState::Completed => {
                return Err(BenchError::InvalidState(format!(
                    "session {} has already completed",
                    self.session_id
                )))
            }
            SessionState::Running => {
                return Err(BenchError::InvalidState(format!(
                    "session {} is already running",
                    self.session_id
                )))
            }
            SessionState::Created | SessionState::Prepared => {}
        }
        self.prepare()?;
        self.state = SessionState::Running;
        Ok(())
    }

    fn finish_run(&mut self, outcomes: Vec<internal::ScenarioOutcome>) -> SessionReport {
        self.state = SessionState::Completed;
        let (preparation, sink) = self.preparation.clone().unwrap_or_else(|| {
            let not_run = StepStatus::Failed("not run".to_string());
            (
                PreparationReport {
                    extensions: not_run.clone(),
                    search_index: not_run.clone(),
                },
                not_run,
            )
        });

        let report = internal::assemble_report(
            &self.session_id,
            self.started_at,
            preparation,
            sink,
            outcomes,
        );
        tracing::info!(
            session = %self.session_id,
            trials = report.trials.len(),
            written = report.observations_written(),
            failed = report.failed_trials(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            "session completed"
        );
        report
    }
}

impl Drop for BenchmarkSession {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            if let Err(e) = db.close() {
                tracing::warn!(session = %self.session_id, error = %e, "failed to close session connection");
            }
        }
    }
}

/// Connect, run every configured scenario and close
pub fn execute(config: &BenchConfig, cancel: CancelFlag) -> Result<SessionReport> {
    let catalog = config.method_catalog()?;
    let mut session =
        BenchmarkSession::connect(&config.database, catalog)?.with_cancellation(cancel);
    let report = session.run_parallel(&config.scenarios, config.run.workers)?;
    if let Err(e) = session.close() {
        tracing::warn!(error = %e, "failed to close session connection");
    }
    Ok(report)
}
