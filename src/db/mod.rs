//! Catalog store access
//!
//! Thin SQLite wrapper owning one connection. Components never open their
//! own connections; they borrow the session's [`CatalogDb`].
//!
//! # Example
//! ```no_run
//! use fuzzbench::db::{CatalogDb, DatabaseConfig};
//!
//! let db = CatalogDb::open(&DatabaseConfig::file("catalog.db"))?;
//! println!("{} rows", db.dataset_size()?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod sqlite;

pub use config::DatabaseConfig;
pub use sqlite::CatalogDb;
