//! Products domain module.
//!
//! This crate contains the catalog's business rules (product validation, the
//! price-change rule, the category taxonomy), implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod price_history;
pub mod product;
pub mod taxonomy;

pub use price_history::{PriceChange, PriceHistoryEntry};
pub use product::{NewImage, NewProduct, Price, Product, ProductImage};
pub use taxonomy::{Category, NewCategory, NewProductType, ProductType};
