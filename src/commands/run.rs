//! Run command - execute a benchmark session from a configuration file

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use fuzzbench::session::{self, SessionReport, TrialRecord};
use fuzzbench::{BenchConfig, CancelFlag, StepStatus};

/// Options for a benchmark run
pub struct RunOptions {
    /// Path to the run configuration
    pub config: PathBuf,
    /// Overrides `run.workers` from the configuration
    pub workers: Option<usize>,
    /// Output as JSON
    pub json: bool,
}

pub fn execute(options: RunOptions) -> Result<()> {
    let mut config = BenchConfig::load_from_file(&options.config)?;
    if let Some(workers) = options.workers {
        config.run.workers = workers;
    }
    config.validate()?;

    if !options.json {
        println!("{}", "🔬 Fuzzy Search Benchmark".bright_cyan());
        println!("   Database: {}", config.database.path);
        println!("   Scenarios: {}", config.scenarios.len());
        println!("   Workers: {}", config.run.workers);
    }

    let report = session::execute(&config, CancelFlag::new())
        .with_context(|| format!("Benchmark session failed on {}", config.database.path))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&report);
    }
    Ok(())
}

fn print_human(report: &SessionReport) {
    println!("   Session: {}", report.session_id);
    if let Some(size) = report.dataset_size() {
        println!("   Catalog rows: {size}");
    }
    for (label, status) in [
        ("extensions", &report.preparation.extensions),
        ("search index", &report.preparation.search_index),
        ("observation table", &report.sink),
    ] {
        if let StepStatus::Failed(e) = status {
            println!("   {} {label}: {e}", "⚠".yellow());
        }
    }

    let mut current: Option<&str> = None;
    for trial in &report.trials {
        if current != Some(trial.scenario.typo.as_str()) {
            current = Some(trial.scenario.typo.as_str());
            println!(
                "\n{} '{}' ({})",
                "Testing".bold(),
                trial.scenario.typo,
                trial.scenario.category
            );
        }
        print_trial(trial);
    }

    for skipped in &report.skipped {
        println!(
            "\n{} {}: {}",
            "Skipped".yellow(),
            skipped.scenario,
            skipped.reason
        );
    }

    println!("\n{}", "Summary".bright_cyan());
    println!("   Trials: {}", report.trials.len());
    println!("   Observations written: {}", report.observations_written());
    println!("   Failed trials: {}", report.failed_trials());
    println!("   Skipped scenarios: {}", report.skipped.len());
    if report.cancelled {
        println!("   {}", "Run was cancelled".yellow());
    }
}

fn print_trial(trial: &TrialRecord) {
    let line = format!(
        "  {:<12} | Time: {:>7.1} ms | Results: {:<4} | Precision: {:.2} | Recall: {:.2} | F1: {:.2}",
        trial.method,
        trial.duration_ms,
        trial.result_count,
        trial.scores.precision,
        trial.scores.recall,
        trial.scores.f1
    );
    match &trial.error {
        Some(e) if trial.is_failed() => println!("{}\n    {}", line.red(), e.dimmed()),
        _ => println!("{line}"),
    }
}
