//! Prepare command - ready a catalog store without running trials

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::path::Path;

use fuzzbench::{BenchConfig, CatalogDb, EnvironmentPreparer, PreparationReport, StepStatus};

#[derive(Serialize)]
struct PrepareOutput<'a> {
    db: &'a str,
    dataset_size: Option<i64>,
    #[serde(flatten)]
    report: &'a PreparationReport,
}

pub fn execute(config_path: &Path, json: bool) -> Result<()> {
    let config = BenchConfig::load_from_file(config_path)?;
    let mut db = CatalogDb::open(&config.database)
        .with_context(|| format!("Failed to open catalog: {}", config.database.path))?;

    let report = EnvironmentPreparer::new().prepare(&mut db);
    let dataset_size = db.dataset_size().ok();

    if json {
        let output = PrepareOutput {
            db: db.target(),
            dataset_size,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", "🔧 Preparing catalog store".bright_cyan());
        println!("   Database: {}", db.target());
        match dataset_size {
            Some(n) => println!("   Catalog rows: {n}"),
            None => println!("   Catalog rows: {}", "unavailable".yellow()),
        }
        println!();
        print_step("Fuzzy functions + FTS5", &report.extensions);
        print_step("Full-text index", &report.search_index);
    }

    db.close()?;
    Ok(())
}

fn print_step(label: &str, status: &StepStatus) {
    match status {
        StepStatus::Ready => println!("   {} {label}", "✓".green()),
        StepStatus::Failed(e) => println!("   {} {label}: {e}", "✗".red()),
    }
}
