//! Catalog store boundary.
//!
//! `CatalogStore` owns products, their images and their price history. The
//! in-memory implementation backs tests and dev runs; the SQLite one is the
//! durable store.

pub mod in_memory;
mod queries;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryCatalogStore;
pub use sqlite::SqliteCatalogStore;
pub use r#trait::CatalogStore;
