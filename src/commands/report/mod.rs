//! Report command - summarize recorded benchmark observations
//!
//! Reads `search_benchmarks` only; never writes to the store. With no
//! matching observations it says so instead of printing empty tables.

mod internal;

use anyhow::Result;
use std::path::PathBuf;

/// Options for report generation
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Catalog database holding the observations
    pub db: PathBuf,
    /// Restrict to one session
    pub session: Option<String>,
    /// Restrict to one method
    pub method: Option<String>,
    /// Output as JSON instead of tables
    pub json: bool,
}

/// Execute report command
pub fn execute(options: ReportOptions) -> Result<()> {
    internal::generate_report(options)
}
