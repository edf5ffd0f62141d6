//! Methods command - list the search methods a run would benchmark

use anyhow::Result;
use colored::*;
use std::path::Path;

use fuzzbench::{BenchConfig, MethodCatalog};

pub fn execute(config_path: Option<&Path>, json: bool) -> Result<()> {
    let catalog = match config_path {
        Some(path) => BenchConfig::load_from_file(path)?.method_catalog()?,
        None => MethodCatalog::builtin(),
    };

    if json {
        let methods: Vec<_> = catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&methods)?);
        return Ok(());
    }

    println!("{}", format!("🔎 {} search methods", catalog.len()).bright_cyan());
    for method in &catalog {
        let index = if method.uses_index {
            "indexed".green()
        } else {
            "scan".dimmed()
        };
        println!("\n   {} [{}]", method.name.bold(), index);
        for line in method.query.lines() {
            println!("      {}", line.trim());
        }
    }
    Ok(())
}
