//! Benchmark scenarios: a correct term paired with a misspelling of it

use serde::{Deserialize, Serialize};

/// One (correct term, typo term) pair supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestScenario {
    /// Spelling used to build the reference set
    pub correct: String,
    /// Misspelling every method is queried with
    pub typo: String,
    /// Kind of error ("transposition", "omission", ...)
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "unspecified".to_string()
}

impl TestScenario {
    pub fn new(
        correct: impl Into<String>,
        typo: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            correct: correct.into(),
            typo: typo.into(),
            category: category.into(),
        }
    }
}

impl std::fmt::Display for TestScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' -> '{}' ({})", self.correct, self.typo, self.category)
    }
}
