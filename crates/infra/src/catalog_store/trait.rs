use std::sync::Arc;

use async_trait::async_trait;

use catalog_core::{CategoryId, ProductId};
use catalog_products::{
    Category, NewCategory, NewImage, NewProduct, NewProductType, PriceHistoryEntry, Product,
    ProductImage, ProductType,
};

use crate::error::StoreResult;

/// Durable storage for products, their images and price history.
///
/// ## Consistency
///
/// Every operation either commits all of its effects or none of them. Reads
/// return fully hydrated aggregates (a `Product` always carries its images) and
/// only ever observe committed state.
///
/// ## Price history
///
/// `update_product_price` always re-persists the price, and appends a
/// `PriceHistoryEntry` if and only if the new price differs from the stored
/// one. Both writes commit together: no reader can see the new price without
/// the history row that goes with it. History rows are never updated and are
/// only removed together with their product.
///
/// ## Identity
///
/// Ids are assigned by the store in strictly increasing order and are never
/// reused, so a deleted product's id can never resolve to another product's
/// rows.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persist a product and its initial images atomically.
    async fn create_product(&self, input: NewProduct) -> StoreResult<Product>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Product>;

    /// All products in creation order (ascending id), images populated.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn update_product_price(&self, id: ProductId, new_price: i64) -> StoreResult<Product>;

    /// History rows for a product, oldest first.
    ///
    /// An empty history is reported as `PriceHistoryNotFound`, the same way an
    /// unknown product is.
    async fn get_price_history(&self, id: ProductId) -> StoreResult<Vec<PriceHistoryEntry>>;

    /// Remove a product together with its images and price history.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    async fn add_product_image(&self, id: ProductId, image: NewImage) -> StoreResult<ProductImage>;

    async fn create_category(&self, input: NewCategory) -> StoreResult<Category>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn create_product_type(&self, input: NewProductType) -> StoreResult<ProductType>;

    async fn list_product_types(&self, category_id: CategoryId) -> StoreResult<Vec<ProductType>>;
}

#[async_trait]
impl<T> CatalogStore for Arc<T>
where
    T: CatalogStore + ?Sized,
{
    async fn create_product(&self, input: NewProduct) -> StoreResult<Product> {
        (**self).create_product(input).await
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        (**self).get_product(id).await
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        (**self).list_products().await
    }

    async fn update_product_price(&self, id: ProductId, new_price: i64) -> StoreResult<Product> {
        (**self).update_product_price(id, new_price).await
    }

    async fn get_price_history(&self, id: ProductId) -> StoreResult<Vec<PriceHistoryEntry>> {
        (**self).get_price_history(id).await
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        (**self).delete_product(id).await
    }

    async fn add_product_image(&self, id: ProductId, image: NewImage) -> StoreResult<ProductImage> {
        (**self).add_product_image(id, image).await
    }

    async fn create_category(&self, input: NewCategory) -> StoreResult<Category> {
        (**self).create_category(input).await
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        (**self).list_categories().await
    }

    async fn create_product_type(&self, input: NewProductType) -> StoreResult<ProductType> {
        (**self).create_product_type(input).await
    }

    async fn list_product_types(&self, category_id: CategoryId) -> StoreResult<Vec<ProductType>> {
        (**self).list_product_types(category_id).await
    }
}
