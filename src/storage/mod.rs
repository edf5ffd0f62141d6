//! Observation storage - the append-only benchmark sink
//!
//! Every completed trial becomes one row of `search_benchmarks`, tagged with
//! the session id. Rows are never updated or deleted by fuzzbench; reporting
//! reads them back, optionally filtered by session or method.
//!
//! # Example
//!
//! ```no_run
//! use fuzzbench::db::{CatalogDb, DatabaseConfig};
//! use fuzzbench::storage::{ObservationFilter, ObservationStore};
//!
//! let db = CatalogDb::open(&DatabaseConfig::file("catalog.db"))?;
//! let store = ObservationStore::new(db.connection());
//! let rows = store.list(&ObservationFilter::default().method("Trigram"))?;
//! println!("{} Trigram observations", rows.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod observations;
pub mod types;

pub use observations::ObservationStore;
pub use types::{Observation, ObservationFilter, PerformanceSummary, QualitySummary};
