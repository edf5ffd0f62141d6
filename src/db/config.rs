//! Store connection configuration
//!
//! Read from the `[database]` table of the run configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path value selecting a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Connection settings for the catalog store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite catalog file, or `:memory:`
    #[serde(default = "default_path")]
    pub path: String,

    /// How long a statement waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Per-query deadline; a trial running longer is interrupted and
    /// recorded as failed. `None` disables the deadline.
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            query_timeout_ms: None,
        }
    }
}

fn default_path() -> String {
    "fuzzbench.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl DatabaseConfig {
    /// Configuration for a private in-memory store
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY.to_string(),
            ..Default::default()
        }
    }

    /// File-backed configuration
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// In-memory stores cannot be shared between connections
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_table() {
        let config: DatabaseConfig = toml::from_str("").unwrap();
        assert_eq!(config.path, "fuzzbench.db");
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(config.query_timeout().is_none());
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_parse_full_table() {
        let config: DatabaseConfig = toml::from_str(
            r#"
            path = ":memory:"
            busy_timeout_ms = 250
            query_timeout_ms = 1500
            "#,
        )
        .unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));
        assert_eq!(config.query_timeout(), Some(Duration::from_millis(1500)));
    }
}
