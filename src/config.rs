//! Benchmark run configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [database]
//! path = "catalog.db"
//! query_timeout_ms = 2000
//!
//! [run]
//! workers = 1
//!
//! [[scenarios]]
//! correct = "computer"
//! typo = "copmuter"
//! category = "transposition"
//! ```
//!
//! When no `[[methods]]` are given the built-in method set is used.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::db::DatabaseConfig;
use crate::error::BenchError;
use crate::methods::{MethodCatalog, SearchMethod};
use crate::scenario::TestScenario;

/// Complete configuration of one benchmark run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub scenarios: Vec<TestScenario>,
    /// Replaces the built-in methods when non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<SearchMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    /// Worker count; 1 runs sequentially on the session connection
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    1
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl BenchConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::load_from_str(&content)
            .with_context(|| format!("Failed to load config: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn load_from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no session could run
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.scenarios.is_empty() {
            return Err(BenchError::Config(
                "at least one [[scenarios]] entry is required".to_string(),
            ));
        }
        if let Some(s) = self
            .scenarios
            .iter()
            .find(|s| s.correct.trim().is_empty() || s.typo.trim().is_empty())
        {
            return Err(BenchError::Config(format!(
                "scenario {s} has an empty term"
            )));
        }
        if self.run.workers == 0 {
            return Err(BenchError::Config("run.workers must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Configured methods, or the built-in set when none are configured
    pub fn method_catalog(&self) -> crate::error::Result<MethodCatalog> {
        if self.methods.is_empty() {
            Ok(MethodCatalog::builtin())
        } else {
            MethodCatalog::from_methods(self.methods.iter().cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
        [[scenarios]]
        correct = "computer"
        typo = "copmuter"
        category = "transposition"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() -> anyhow::Result<()> {
        let config = BenchConfig::load_from_str(MINIMAL)?;
        assert_eq!(config.database.path, "fuzzbench.db");
        assert_eq!(config.run.workers, 1);
        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.method_catalog()?.len(), 8);
        Ok(())
    }

    #[test]
    fn test_configured_methods_replace_builtin() -> anyhow::Result<()> {
        let config = BenchConfig::load_from_str(&format!(
            r#"{MINIMAL}
            [[methods]]
            name = "Prefix"
            query = "SELECT id FROM products WHERE name LIKE ?1 || '%'"
            "#
        ))?;

        let catalog = config.method_catalog()?;
        assert_eq!(catalog.names(), vec!["Prefix"]);
        assert!(!catalog.get("Prefix").map(|m| m.uses_index).unwrap_or(true));
        Ok(())
    }

    #[test]
    fn test_duplicate_configured_methods_rejected() -> anyhow::Result<()> {
        let config = BenchConfig::load_from_str(&format!(
            r#"{MINIMAL}
            [[methods]]
            name = "A"
            query = "SELECT id FROM products WHERE name = ?1"
            [[methods]]
            name = "A"
            query = "SELECT id FROM products WHERE description = ?1"
            "#
        ))?;
        assert!(config.method_catalog().is_err());
        Ok(())
    }

    #[test]
    fn test_validation_failures() {
        assert!(BenchConfig::load_from_str("").is_err());
        assert!(BenchConfig::load_from_str(
            "[[scenarios]]\ncorrect = \"mouse\"\ntypo = \"  \""
        )
        .is_err());
        assert!(BenchConfig::load_from_str(&format!("[run]\nworkers = 0\n{MINIMAL}")).is_err());
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("bench.toml");
        fs::write(
            &path,
            format!("[database]\npath = \"catalog.db\"\nquery_timeout_ms = 250\n{MINIMAL}"),
        )?;

        let config = BenchConfig::load_from_file(&path)?;
        assert_eq!(config.database.path, "catalog.db");
        assert_eq!(config.database.query_timeout_ms, Some(250));
        Ok(())
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = BenchConfig::load_from_file(Path::new("/no/such/bench.toml")).unwrap_err();
        assert!(err.to_string().contains("/no/such/bench.toml"));
    }
}
