//! Fuzzy-search benchmarking over a SQLite product catalog
//!
//! Runs competing search methods (pattern match, trigram similarity, edit
//! distance, phonetic codes, full-text search) against misspelled queries,
//! scores each against a ground-truth set and records one observation per
//! (method, scenario) trial.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod fuzzy;
pub mod methods;
pub mod metrics;
pub mod prepare;
pub mod reference;
pub mod scenario;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::BenchConfig;
pub use db::{CatalogDb, DatabaseConfig};
pub use error::{BenchError, Result};
pub use methods::{MethodCatalog, SearchMethod};
pub use metrics::Scores;
pub use prepare::{EnvironmentPreparer, PreparationReport, StepStatus};
pub use scenario::TestScenario;
pub use session::{BenchmarkSession, CancelFlag, SessionReport, SessionState};
pub use storage::{Observation, ObservationFilter, ObservationStore};
