//! Catalog schema shared by every component that reads the product store
//!
//! The `products` table is owned by whoever loads the catalog. fuzzbench
//! only reads `id`, `name` and `description`, and maintains the derived
//! `products_fts` index.

use std::collections::BTreeSet;

/// Stable catalog item identifier (`products.id`)
pub type ItemId = i64;

/// Unordered set of catalog identifiers
///
/// Retrieved, relevant and reference collections are always sets: ordering
/// carries no meaning for precision/recall and duplicates count once.
/// `BTreeSet` keeps log output and test assertions deterministic.
pub type IdSet = BTreeSet<ItemId>;

/// Row count of the catalog, recorded as `dataset_size` on observations
pub const DATASET_SIZE_SQL: &str = "SELECT COUNT(id) FROM products";

/// Minimal catalog DDL, for tests and local experiments
///
/// Real catalogs carry more columns (category, brand, sku); only these
/// three are read.
pub const CATALOG_DDL: &str = "
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )";
