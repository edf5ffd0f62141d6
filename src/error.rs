//! Error types for fuzzbench
//!
//! Each variant maps to one isolation boundary of a benchmark session.
//! Only [`BenchError::Connection`] is fatal; every other kind is logged by the
//! session and confined to the step, scenario, or trial that raised it.

use thiserror::Error;

/// The primary error type for benchmark operations.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Initial store connection failed - the session cannot start
    #[error("Connection error ({target}): {source}")]
    Connection {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Extension or search-index setup failed - session continues degraded
    #[error("Preparation error in step '{step}': {source}")]
    Preparation {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Ground truth could not be computed - the scenario is skipped
    #[error("Reference resolution failed for '{term}': {source}")]
    ReferenceResolution {
        term: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A method's query failed or timed out - recorded as a zero-result trial
    #[error("Query execution failed for method '{method}' with '{term}': {source}")]
    QueryExecution {
        method: String,
        term: String,
        #[source]
        source: rusqlite::Error,
    },

    /// An observation could not be persisted - the trial is marked failed
    #[error("Observation write failed for method '{method}' with '{term}': {source}")]
    ObservationWrite {
        method: String,
        term: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Invalid method registry or run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not allowed in the session's current state
    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

impl BenchError {
    /// Short kind label used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Preparation { .. } => "preparation",
            Self::ReferenceResolution { .. } => "reference_resolution",
            Self::QueryExecution { .. } => "query_execution",
            Self::ObservationWrite { .. } => "observation_write",
            Self::Config(_) => "config",
            Self::InvalidState(_) => "invalid_state",
        }
    }

    /// True when the error must abort the caller instead of being isolated
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// A specialized `Result` type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;
