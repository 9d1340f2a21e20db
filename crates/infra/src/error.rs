//! Store error model and SQLx error mapping.
//!
//! ## Error Mapping
//!
//! | SQLx Error | SQLite code | StoreError |
//! |------------|-------------|------------|
//! | Database (unique violation) | `2067` / `1555` | `Conflict` |
//! | Database (foreign key violation) | `787` | `Conflict` |
//! | Database (check constraint) | `275` | `Validation` |
//! | Database (other) | any | `Storage` |
//! | PoolClosed, Io, Tls, ... | n/a | `Storage` |

use thiserror::Error;

use catalog_core::{CategoryId, DomainError, ProductId, ProductTypeId};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The product has no recorded price changes, or does not exist.
    #[error("price history not found for product {0}")]
    PriceHistoryNotFound(ProductId),

    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("product type {0} not found")]
    ProductTypeNotFound(ProductTypeId),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed; the operation had no effect.
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::ProductNotFound(_)
                | StoreError::PriceHistoryNotFound(_)
                | StoreError::CategoryNotFound(_)
                | StoreError::ProductTypeNotFound(_)
                | StoreError::NotFound(_)
        )
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => StoreError::Validation(msg),
            DomainError::NotFound(what) => StoreError::NotFound(what),
            DomainError::Conflict(msg) => StoreError::Conflict(msg),
        }
    }
}

/// Map a SQLx error into a `StoreError`, tagging it with the failed operation.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
                Some("2067") | Some("1555") => StoreError::Conflict(msg),
                // SQLITE_CONSTRAINT_FOREIGNKEY
                Some("787") => StoreError::Conflict(msg),
                // SQLITE_CONSTRAINT_CHECK
                Some("275") => StoreError::Validation(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Storage(format!("timed out acquiring connection in {}", operation))
        }
        other => StoreError::Storage(format!("{} failed: {}", operation, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_onto_store_errors() {
        assert_eq!(
            StoreError::from(DomainError::validation("name cannot be empty")),
            StoreError::Validation("name cannot be empty".to_string())
        );
        assert!(StoreError::from(DomainError::not_found("thing")).is_not_found());
        assert!(matches!(
            StoreError::from(DomainError::conflict("dup")),
            StoreError::Conflict(_)
        ));
    }

    #[test]
    fn pool_closed_is_a_storage_error() {
        let err = map_sqlx_error("get_product", sqlx::Error::PoolClosed);
        assert_eq!(
            err,
            StoreError::Storage("connection pool closed in get_product".to_string())
        );
    }

    #[test]
    fn history_and_product_misses_are_both_not_found() {
        assert!(StoreError::ProductNotFound(ProductId::new(1)).is_not_found());
        assert!(StoreError::PriceHistoryNotFound(ProductId::new(1)).is_not_found());
        assert!(!StoreError::Storage("x".into()).is_not_found());
    }
}
