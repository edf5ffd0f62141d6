//! Domain types for the observation sink
//!
//! These types are storage-agnostic; [`super::ObservationStore`] maps them to
//! and from SQLite rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::Scores;

/// One persisted benchmark trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub session_id: String,
    pub method: String,
    pub dataset_size: i64,
    /// The typo term the method was queried with
    pub query_text: String,
    pub execution_time_ms: f64,
    pub result_count: i64,
    pub index_used: bool,
    pub correct_term: String,
    pub error_category: String,
    #[serde(flatten)]
    pub scores: Scores,
    /// False when the query failed and was recorded as a zero-result trial
    pub succeeded: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Row filter for reading observations back
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    pub session_id: Option<String>,
    pub method: Option<String>,
}

impl ObservationFilter {
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

/// Latency summary of one method at one dataset size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub method: String,
    pub dataset_size: i64,
    pub trials: usize,
    pub avg_time_ms: f64,
    pub median_time_ms: f64,
    pub avg_results: f64,
    /// Share of trials run by an index-backed method, in percent
    pub index_usage_pct: f64,
}

/// Mean retrieval quality of one method for one error category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    pub error_category: String,
    pub method: String,
    pub trials: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}
