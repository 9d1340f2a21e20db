use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use catalog_core::{CategoryId, ImageId, PriceHistoryId, ProductId, ProductTypeId};
use catalog_products::{
    Category, NewCategory, NewImage, NewProduct, NewProductType, Price, PriceChange,
    PriceHistoryEntry, Product, ProductImage, ProductType,
};

use super::r#trait::CatalogStore;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct ProductRow {
    name: String,
    description: Option<String>,
    price: Price,
    product_type_id: Option<ProductTypeId>,
}

/// Monotonic id sequences; never rewound, so deleted ids are not reused.
#[derive(Debug, Default)]
struct Sequences {
    product: i64,
    image: i64,
    history: i64,
    category: i64,
    product_type: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct CatalogState {
    seq: Sequences,
    products: BTreeMap<ProductId, ProductRow>,
    images: BTreeMap<ImageId, ProductImage>,
    history: BTreeMap<PriceHistoryId, PriceHistoryEntry>,
    categories: BTreeMap<CategoryId, Category>,
    product_types: BTreeMap<ProductTypeId, ProductType>,
}

impl CatalogState {
    fn hydrate(&self, id: ProductId, row: &ProductRow) -> Product {
        Product {
            id,
            name: row.name.clone(),
            description: row.description.clone(),
            price: row.price,
            product_type_id: row.product_type_id,
            images: self
                .images
                .values()
                .filter(|i| i.product_id == id)
                .cloned()
                .collect(),
        }
    }

    fn product(&self, id: ProductId) -> StoreResult<Product> {
        let row = self.products.get(&id).ok_or(StoreError::ProductNotFound(id))?;
        Ok(self.hydrate(id, row))
    }

    fn insert_image(&mut self, product_id: ProductId, url: String) -> ProductImage {
        let image = ProductImage {
            id: ImageId::new(next(&mut self.seq.image)),
            product_id,
            url,
        };
        self.images.insert(image.id, image.clone());
        image
    }

    fn append_history(&mut self, product_id: ProductId, price: Price, now: DateTime<Utc>) {
        // Never record a timestamp earlier than the product's previous entry.
        let timestamp = self
            .history
            .values()
            .rev()
            .find(|e| e.product_id == product_id)
            .map_or(now, |last| last.timestamp.max(now));

        let entry = PriceHistoryEntry {
            id: PriceHistoryId::new(next(&mut self.seq.history)),
            product_id,
            price,
            timestamp,
        };
        self.history.insert(entry.id, entry);
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. A single lock guards the whole catalog, so every
/// write operation (including price update + history append) is one critical
/// section.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, CatalogState>> {
        self.state
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, CatalogState>> {
        self.state
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn create_product(&self, input: NewProduct) -> StoreResult<Product> {
        let price = input.validate()?;
        let mut state = self.write()?;

        if let Some(type_id) = input.product_type_id {
            if !state.product_types.contains_key(&type_id) {
                return Err(StoreError::ProductTypeNotFound(type_id));
            }
        }

        let id = ProductId::new(next(&mut state.seq.product));
        state.products.insert(
            id,
            ProductRow {
                name: input.name,
                description: input.description,
                price,
                product_type_id: input.product_type_id,
            },
        );
        for image in input.images {
            state.insert_image(id, image.url);
        }

        tracing::debug!(product_id = %id, "product created");
        state.product(id)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        self.read()?.product(id)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let state = self.read()?;
        Ok(state
            .products
            .iter()
            .map(|(id, row)| state.hydrate(*id, row))
            .collect())
    }

    async fn update_product_price(&self, id: ProductId, new_price: i64) -> StoreResult<Product> {
        let new_price = Price::new(new_price)?;
        let mut state = self.write()?;

        let change = {
            let row = state
                .products
                .get_mut(&id)
                .ok_or(StoreError::ProductNotFound(id))?;
            let change = PriceChange::between(row.price, new_price);
            row.price = new_price;
            change
        };

        if let Some(price) = change.recorded_price() {
            state.append_history(id, price, Utc::now());
            tracing::info!(product_id = %id, ?change, "price changed");
        } else {
            tracing::debug!(product_id = %id, "price unchanged; no history recorded");
        }

        state.product(id)
    }

    async fn get_price_history(&self, id: ProductId) -> StoreResult<Vec<PriceHistoryEntry>> {
        let state = self.read()?;
        let mut entries: Vec<_> = state
            .history
            .values()
            .filter(|e| e.product_id == id)
            .cloned()
            .collect();
        if entries.is_empty() {
            return Err(StoreError::PriceHistoryNotFound(id));
        }
        entries.sort_by_key(|e| (e.timestamp, e.id));
        Ok(entries)
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.products.remove(&id).is_none() {
            return Err(StoreError::ProductNotFound(id));
        }
        state.images.retain(|_, i| i.product_id != id);
        state.history.retain(|_, e| e.product_id != id);
        tracing::debug!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn add_product_image(&self, id: ProductId, image: NewImage) -> StoreResult<ProductImage> {
        image.validate()?;
        let mut state = self.write()?;
        if !state.products.contains_key(&id) {
            return Err(StoreError::ProductNotFound(id));
        }
        Ok(state.insert_image(id, image.url))
    }

    async fn create_category(&self, input: NewCategory) -> StoreResult<Category> {
        input.validate()?;
        let mut state = self.write()?;
        let category = Category {
            id: CategoryId::new(next(&mut state.seq.category)),
            name: input.name,
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn create_product_type(&self, input: NewProductType) -> StoreResult<ProductType> {
        input.validate()?;
        let mut state = self.write()?;
        if !state.categories.contains_key(&input.category_id) {
            return Err(StoreError::CategoryNotFound(input.category_id));
        }
        let product_type = ProductType {
            id: ProductTypeId::new(next(&mut state.seq.product_type)),
            category_id: input.category_id,
            name: input.name,
        };
        state.product_types.insert(product_type.id, product_type.clone());
        Ok(product_type)
    }

    async fn list_product_types(&self, category_id: CategoryId) -> StoreResult<Vec<ProductType>> {
        let state = self.read()?;
        if !state.categories.contains_key(&category_id) {
            return Err(StoreError::CategoryNotFound(category_id));
        }
        Ok(state
            .product_types
            .values()
            .filter(|t| t.category_id == category_id)
            .cloned()
            .collect())
    }
}
