//! Ground truth for a scenario
//!
//! The reference set of a correct term is every catalog item whose name or
//! description contains the term, ignoring case (Unicode, via the `fold`
//! function registered by [`crate::prepare`]). It is resolved once per
//! scenario and shared by all methods scored against that scenario.

use rusqlite::params;

use crate::catalog::IdSet;
use crate::db::CatalogDb;
use crate::error::{BenchError, Result};

const REFERENCE_SQL: &str = "
    SELECT id FROM products
    WHERE instr(fold(name), fold(?1)) > 0
       OR instr(fold(description), fold(?1)) > 0";

/// Reference set plus the catalog size it was resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReference {
    pub relevant: IdSet,
    pub dataset_size: i64,
}

/// Computes reference sets with a tolerant substring match
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceResolver;

impl ReferenceResolver {
    pub fn new() -> Self {
        Self
    }

    /// Ids of items whose name or description contains `correct`
    pub fn resolve(&self, db: &CatalogDb, correct: &str) -> Result<IdSet> {
        let wrap = |source| BenchError::ReferenceResolution {
            term: correct.to_string(),
            source,
        };

        let mut stmt = db.connection().prepare_cached(REFERENCE_SQL).map_err(wrap)?;
        let ids = stmt
            .query_map(params![correct], |row| row.get(0))
            .map_err(wrap)?
            .collect::<rusqlite::Result<IdSet>>()
            .map_err(wrap)?;

        Ok(ids)
    }

    /// Reference set and dataset size for one scenario
    pub fn resolve_scenario(&self, db: &CatalogDb, correct: &str) -> Result<ScenarioReference> {
        let relevant = self.resolve(db, correct)?;
        let dataset_size = db
            .dataset_size()
            .map_err(|source| BenchError::ReferenceResolution {
                term: correct.to_string(),
                source,
            })?;

        Ok(ScenarioReference {
            relevant,
            dataset_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG_DDL;
    use crate::prepare::register_fuzzy_functions;

    fn catalog() -> anyhow::Result<CatalogDb> {
        let db = CatalogDb::open_in_memory()?;
        register_fuzzy_functions(db.connection())?;
        db.connection().execute_batch(CATALOG_DDL)?;
        for (id, name, description) in [
            (101, "CircuitInnovate Computer Nova A1B2C3", "Product: desktop"),
            (202, "TitanActive Workstation", "Fast COMPUTER for gaming"),
            (303, "HearthCrafters Monitor", "Product: 27 inch"),
            (404, "DreamPlayLabs 100% Cotton", "under_score"),
            (505, "Монитор Samsung", "Описание товара: экран"),
            (606, "Ноутбук", "быстрый МОНИТОР в комплекте"),
        ] {
            db.connection().execute(
                "INSERT INTO products (id, name, description) VALUES (?1, ?2, ?3)",
                params![id, name, description],
            )?;
        }
        Ok(db)
    }

    fn ids(values: &[i64]) -> IdSet {
        values.iter().copied().collect()
    }

    #[test]
    fn test_matches_name_or_description_ignoring_case() -> anyhow::Result<()> {
        let db = catalog()?;
        let resolver = ReferenceResolver::new();
        assert_eq!(resolver.resolve(&db, "computer")?, ids(&[101, 202]));
        assert_eq!(resolver.resolve(&db, "MONITOR")?, ids(&[303]));
        Ok(())
    }

    #[test]
    fn test_non_ascii_case_is_folded() -> anyhow::Result<()> {
        let db = catalog()?;
        let resolver = ReferenceResolver::new();
        assert_eq!(resolver.resolve(&db, "монитор")?, ids(&[505, 606]));
        assert_eq!(resolver.resolve(&db, "ОПИСАНИЕ")?, ids(&[505]));
        Ok(())
    }

    #[test]
    fn test_unknown_term_is_empty() -> anyhow::Result<()> {
        let db = catalog()?;
        assert!(ReferenceResolver::new().resolve(&db, "keyboard")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_wildcards_match_literally() -> anyhow::Result<()> {
        let db = catalog()?;
        let resolver = ReferenceResolver::new();
        assert_eq!(resolver.resolve(&db, "100%")?, ids(&[404]));
        // as a LIKE pattern "d_r" would match "under"
        assert_eq!(resolver.resolve(&db, "d_r")?, ids(&[]));
        assert_eq!(resolver.resolve(&db, "r_score")?, ids(&[404]));
        assert_eq!(resolver.resolve(&db, "%")?, ids(&[404]));
        Ok(())
    }

    #[test]
    fn test_scenario_reference_carries_dataset_size() -> anyhow::Result<()> {
        let db = catalog()?;
        let reference = ReferenceResolver::new().resolve_scenario(&db, "computer")?;
        assert_eq!(reference.dataset_size, 6);
        assert_eq!(reference.relevant.len(), 2);
        Ok(())
    }

    #[test]
    fn test_missing_catalog_is_resolution_error() -> anyhow::Result<()> {
        let db = CatalogDb::open_in_memory()?;
        register_fuzzy_functions(db.connection())?;
        let err = ReferenceResolver::new()
            .resolve(&db, "computer")
            .unwrap_err();
        assert_eq!(err.kind(), "reference_resolution");
        Ok(())
    }
}
