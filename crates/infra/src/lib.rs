//! Infrastructure layer: catalog persistence, credential records, DB wiring.

pub mod catalog_store;
pub mod db;
pub mod error;
pub mod user_store;

pub use catalog_store::{CatalogStore, InMemoryCatalogStore, SqliteCatalogStore};
pub use db::DbSettings;
pub use error::{StoreError, StoreResult};
pub use user_store::{InMemoryUserStore, SqliteUserStore, UserStore};
