//! Internal implementation for report command

use anyhow::{Context, Result};
use chrono::Utc;
use colored::*;
use serde::Serialize;

use super::ReportOptions;
use fuzzbench::storage::{PerformanceSummary, QualitySummary};
use fuzzbench::{CatalogDb, DatabaseConfig, ObservationFilter, ObservationStore};

#[derive(Debug, Serialize)]
struct Report {
    generated: String,
    db: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    observations: usize,
    performance: Vec<PerformanceSummary>,
    quality: Vec<QualitySummary>,
}

pub fn generate_report(options: ReportOptions) -> Result<()> {
    if !options.db.exists() {
        anyhow::bail!(
            "No catalog database found at {}. Run 'fuzzbench run' first.",
            options.db.display()
        );
    }

    let db_path = options.db.to_string_lossy().into_owned();
    let db = CatalogDb::open(&DatabaseConfig::file(db_path.clone()))
        .with_context(|| format!("Failed to open database: {db_path}"))?;
    let store = ObservationStore::new(db.connection());

    if !store.has_schema()? {
        anyhow::bail!(
            "No search_benchmarks table in {db_path}. Run 'fuzzbench run' first."
        );
    }

    let filter = ObservationFilter {
        session_id: options.session.clone(),
        method: options.method.clone(),
    };
    let report = Report {
        generated: Utc::now().to_rfc3339(),
        db: db_path,
        session: options.session,
        method: options.method,
        observations: store.count(&filter)?,
        performance: store
            .performance_summary(&filter)
            .context("Failed to summarize performance")?,
        quality: store
            .quality_by_category(&filter)
            .context("Failed to summarize quality")?,
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.observations == 0 {
        println!("No observations match the given filters.");
    } else {
        print_tables(&report);
    }

    db.close()?;
    Ok(())
}

fn print_tables(report: &Report) {
    println!("{}", "📊 Fuzzy Search Benchmark Report".bright_cyan());
    println!("   Database: {}", report.db);
    if let Some(session) = &report.session {
        println!("   Session: {session}");
    }
    if let Some(method) = &report.method {
        println!("   Method: {method}");
    }
    println!("   Observations: {}", report.observations);

    println!("\n{}", "Performance".bold());
    println!(
        "   {:<12} {:>10} {:>7} {:>10} {:>10} {:>9} {:>8}",
        "Method", "Rows", "Trials", "Avg ms", "Median ms", "Results", "Index %"
    );
    for row in &report.performance {
        println!(
            "   {:<12} {:>10} {:>7} {:>10.2} {:>10.2} {:>9.1} {:>7.0}%",
            row.method,
            row.dataset_size,
            row.trials,
            row.avg_time_ms,
            row.median_time_ms,
            row.avg_results,
            row.index_usage_pct
        );
    }

    println!("\n{}", "Quality by error category".bold());
    println!(
        "   {:<15} {:<12} {:>7} {:>10} {:>8} {:>6}",
        "Category", "Method", "Trials", "Precision", "Recall", "F1"
    );
    for row in &report.quality {
        println!(
            "   {:<15} {:<12} {:>7} {:>10.2} {:>8.2} {:>6.2}",
            row.error_category, row.method, row.trials, row.precision, row.recall, row.f1
        );
    }
}
