//! `catalog-core`: identifiers and the domain error model shared by every catalog crate.
//!
//! Pure domain primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ImageId, PriceHistoryId, ProductId, ProductTypeId, UserId};
