//! SQLite-backed catalog store.
//!
//! Every operation runs inside one SQLx transaction. The transaction handle is
//! acquired at the top of the operation, its connection is passed explicitly
//! into the `queries` functions, and it is committed as the last step. Any
//! early return drops the handle, which rolls the transaction back.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{Span, instrument};

use catalog_core::{CategoryId, ProductId};
use catalog_products::{
    Category, NewCategory, NewImage, NewProduct, NewProductType, Price, PriceChange,
    PriceHistoryEntry, Product, ProductImage, ProductType,
};

use super::queries;
use super::r#trait::CatalogStore;
use crate::error::{StoreError, StoreResult, map_sqlx_error};

/// SQLite catalog store.
///
/// `SqlitePool` is `Send + Sync` and cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Wrap a pool whose schema has already been migrated (see [`crate::db::connect`]).
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn begin(&self, operation: &str) -> StoreResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(&format!("{operation}: begin_transaction"), e))
    }

    async fn commit(tx: Transaction<'static, Sqlite>, operation: &str) -> StoreResult<()> {
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(&format!("{operation}: commit_transaction"), e))
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    #[instrument(
        skip(self, input),
        fields(name = %input.name, images = input.images.len(), product_id = tracing::field::Empty),
        err
    )]
    async fn create_product(&self, input: NewProduct) -> StoreResult<Product> {
        let price = input.validate()?;
        let mut tx = self.begin("create_product").await?;

        let id = queries::insert_product(
            &mut tx,
            &input.name,
            input.description.as_deref(),
            price,
            input.product_type_id,
        )
        .await?;
        let Some(id) = id else {
            // Input is validated, so an empty insert means the product type is unknown.
            return Err(input
                .product_type_id
                .map(StoreError::ProductTypeNotFound)
                .unwrap_or_else(|| StoreError::Storage("product insert returned no row".to_string())));
        };

        for image in &input.images {
            queries::insert_image(&mut tx, id, &image.url)
                .await?
                .ok_or(StoreError::ProductNotFound(id))?;
        }

        let product = queries::fetch_product(&mut tx, id)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;
        Self::commit(tx, "create_product").await?;

        Span::current().record("product_id", id.get());
        tracing::debug!(product_id = %id, "product created");
        Ok(product)
    }

    #[instrument(skip(self), err)]
    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let mut tx = self.begin("get_product").await?;
        let product = queries::fetch_product(&mut tx, id)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;
        Self::commit(tx, "get_product").await?;
        Ok(product)
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut tx = self.begin("list_products").await?;
        let products = queries::fetch_all_products(&mut tx).await?;
        Self::commit(tx, "list_products").await?;
        Ok(products)
    }

    #[instrument(skip(self), err)]
    async fn update_product_price(&self, id: ProductId, new_price: i64) -> StoreResult<Product> {
        let new_price = Price::new(new_price)?;
        let mut tx = self.begin("update_product_price").await?;

        let old_price = queries::lock_product_price(&mut tx, id)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;

        let change = PriceChange::between(old_price, new_price);
        queries::set_product_price(&mut tx, id, new_price).await?;
        if let Some(price) = change.recorded_price() {
            queries::append_price_history(&mut tx, id, price, Utc::now()).await?;
        }

        let product = queries::fetch_product(&mut tx, id)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;
        Self::commit(tx, "update_product_price").await?;

        match change {
            PriceChange::Changed { from, to } => {
                tracing::info!(product_id = %id, %from, %to, "price changed");
            }
            PriceChange::Unchanged => {
                tracing::debug!(product_id = %id, "price unchanged; no history recorded");
            }
        }
        Ok(product)
    }

    #[instrument(skip(self), err)]
    async fn get_price_history(&self, id: ProductId) -> StoreResult<Vec<PriceHistoryEntry>> {
        let mut tx = self.begin("get_price_history").await?;
        let entries = queries::fetch_price_history(&mut tx, id).await?;
        Self::commit(tx, "get_price_history").await?;

        if entries.is_empty() {
            return Err(StoreError::PriceHistoryNotFound(id));
        }
        Ok(entries)
    }

    #[instrument(skip(self), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut tx = self.begin("delete_product").await?;
        // Images and history go with the product (ON DELETE CASCADE).
        if !queries::delete_product(&mut tx, id).await? {
            return Err(StoreError::ProductNotFound(id));
        }
        Self::commit(tx, "delete_product").await?;
        tracing::debug!(product_id = %id, "product deleted");
        Ok(())
    }

    #[instrument(skip(self, image), err)]
    async fn add_product_image(&self, id: ProductId, image: NewImage) -> StoreResult<ProductImage> {
        image.validate()?;
        let mut tx = self.begin("add_product_image").await?;
        let image = queries::insert_image(&mut tx, id, &image.url)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;
        Self::commit(tx, "add_product_image").await?;
        Ok(image)
    }

    #[instrument(skip(self, input), fields(name = %input.name), err)]
    async fn create_category(&self, input: NewCategory) -> StoreResult<Category> {
        input.validate()?;
        let mut tx = self.begin("create_category").await?;
        let category = queries::insert_category(&mut tx, &input.name).await?;
        Self::commit(tx, "create_category").await?;
        Ok(category)
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut tx = self.begin("list_categories").await?;
        let categories = queries::fetch_categories(&mut tx).await?;
        Self::commit(tx, "list_categories").await?;
        Ok(categories)
    }

    #[instrument(skip(self, input), fields(category_id = %input.category_id, name = %input.name), err)]
    async fn create_product_type(&self, input: NewProductType) -> StoreResult<ProductType> {
        input.validate()?;
        let mut tx = self.begin("create_product_type").await?;
        let product_type = queries::insert_product_type(&mut tx, input.category_id, &input.name)
            .await?
            .ok_or(StoreError::CategoryNotFound(input.category_id))?;
        Self::commit(tx, "create_product_type").await?;
        Ok(product_type)
    }

    #[instrument(skip(self), err)]
    async fn list_product_types(&self, category_id: CategoryId) -> StoreResult<Vec<ProductType>> {
        let mut tx = self.begin("list_product_types").await?;
        if !queries::category_exists(&mut tx, category_id).await? {
            return Err(StoreError::CategoryNotFound(category_id));
        }
        let types = queries::fetch_product_types(&mut tx, category_id).await?;
        Self::commit(tx, "list_product_types").await?;
        Ok(types)
    }
}
