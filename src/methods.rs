//! Search method registry
//!
//! A [`SearchMethod`] is a read-only SQL query returning catalog ids in its
//! first column, with a single `?1` slot bound to the typo term. Methods are
//! registered through [`MethodCatalogBuilder`] and frozen into a
//! [`MethodCatalog`] before a session starts, so every scenario of a run
//! sees the same method set in the same order.

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::fuzzy::DEFAULT_SIMILARITY_THRESHOLD;

/// Placeholder the typo term is bound to
pub const TERM_PLACEHOLDER: &str = "?1";

/// One search strategy under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMethod {
    /// Unique method name ("Trigram", "FTS", ...)
    pub name: String,
    /// Parameterized query; `?1` receives the search term
    pub query: String,
    /// Whether the method is backed by an index
    #[serde(default)]
    pub uses_index: bool,
}

impl SearchMethod {
    pub fn new(name: impl Into<String>, query: impl Into<String>, uses_index: bool) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            uses_index,
        }
    }
}

/// Immutable, insertion-ordered set of search methods
#[derive(Debug, Clone, Default)]
pub struct MethodCatalog {
    methods: Vec<SearchMethod>,
}

impl MethodCatalog {
    pub fn builder() -> MethodCatalogBuilder {
        MethodCatalogBuilder::default()
    }

    /// Build a catalog from configured methods, in the given order
    pub fn from_methods(methods: impl IntoIterator<Item = SearchMethod>) -> Result<Self> {
        methods
            .into_iter()
            .try_fold(Self::builder(), |builder, method| builder.register(method))
            .map(MethodCatalogBuilder::build)
    }

    /// The standard comparison set: pattern match, trigram, edit distance,
    /// phonetic codes, full-text search and a trigram/full-text hybrid
    pub fn builtin() -> Self {
        Self {
            methods: vec![
                SearchMethod::new(
                    "LIKE",
                    "SELECT id FROM products WHERE instr(name, ?1) > 0",
                    false,
                ),
                SearchMethod::new(
                    "ILIKE",
                    "SELECT id FROM products WHERE instr(fold(name), fold(?1)) > 0",
                    false,
                ),
                SearchMethod::new(
                    "Trigram",
                    format!(
                        "SELECT id FROM products WHERE similarity(name, ?1) >= {DEFAULT_SIMILARITY_THRESHOLD}"
                    ),
                    true,
                ),
                SearchMethod::new(
                    "Levenshtein",
                    "SELECT id FROM products WHERE levenshtein(name, ?1) <= 3",
                    false,
                ),
                SearchMethod::new(
                    "Soundex",
                    "SELECT id FROM products WHERE soundex(name) = soundex(?1)",
                    false,
                ),
                SearchMethod::new(
                    "Metaphone",
                    "SELECT id FROM products WHERE metaphone(name, 10) = metaphone(?1, 10)",
                    false,
                ),
                SearchMethod::new(
                    "FTS",
                    "SELECT rowid FROM products_fts
                     WHERE products_fts MATCH '\"' || replace(?1, '\"', '\"\"') || '\"'",
                    true,
                ),
                SearchMethod::new(
                    "Hybrid",
                    format!(
                        "SELECT id FROM products WHERE similarity(name, ?1) >= {DEFAULT_SIMILARITY_THRESHOLD}
                     UNION
                     SELECT rowid FROM products_fts
                     WHERE products_fts MATCH '\"' || replace(?1, '\"', '\"\"') || '\"'"
                    ),
                    true,
                ),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&SearchMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Methods in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, SearchMethod> {
        self.methods.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<'a> IntoIterator for &'a MethodCatalog {
    type Item = &'a SearchMethod;
    type IntoIter = std::slice::Iter<'a, SearchMethod>;

    fn into_iter(self) -> Self::IntoIter {
        self.methods.iter()
    }
}

/// Configuration-time registration of search methods
#[derive(Debug, Default)]
pub struct MethodCatalogBuilder {
    methods: Vec<SearchMethod>,
}

impl MethodCatalogBuilder {
    /// Add a method; names must be unique and the query must bind `?1`
    pub fn register(mut self, method: SearchMethod) -> Result<Self> {
        if method.name.trim().is_empty() {
            return Err(BenchError::Config("method name must not be empty".into()));
        }
        if !method.query.contains(TERM_PLACEHOLDER) {
            return Err(BenchError::Config(format!(
                "method '{}' query has no {} placeholder",
                method.name, TERM_PLACEHOLDER
            )));
        }
        if self.methods.iter().any(|m| m.name == method.name) {
            return Err(BenchError::Config(format!(
                "duplicate method '{}'",
                method.name
            )));
        }

        self.methods.push(method);
        Ok(self)
    }

    pub fn build(self) -> MethodCatalog {
        MethodCatalog {
            methods: self.methods,
        }
    }
}
