//! SQL statements for the SQLite catalog store.
//!
//! Every function takes the connection of an open transaction; the caller owns
//! the transaction and decides when it commits. Write paths issue a write as
//! their first statement so the transaction holds SQLite's write lock before
//! it reads anything it later depends on.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use catalog_core::{CategoryId, ImageId, PriceHistoryId, ProductId, ProductTypeId};
use catalog_products::{Category, Price, PriceHistoryEntry, Product, ProductImage, ProductType};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRecord {
    id: i64,
    name: String,
    description: Option<String>,
    price: i64,
    product_type_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ImageRecord {
    id: i64,
    product_id: i64,
    url: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PriceHistoryRecord {
    id: i64,
    product_id: i64,
    price: i64,
    recorded_at: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CategoryRecord {
    id: i64,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductTypeRecord {
    id: i64,
    category_id: i64,
    name: String,
}

fn stored_price(raw: i64) -> StoreResult<Price> {
    Price::new(raw).map_err(|_| StoreError::Storage(format!("corrupt price {raw} in store")))
}

pub(crate) fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_micros(raw: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(raw)
        .ok_or_else(|| StoreError::Storage(format!("corrupt timestamp {raw} in store")))
}

impl ProductRecord {
    fn into_product(self, images: Vec<ProductImage>) -> StoreResult<Product> {
        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            description: self.description,
            price: stored_price(self.price)?,
            product_type_id: self.product_type_id.map(ProductTypeId::new),
            images,
        })
    }
}

impl From<ImageRecord> for ProductImage {
    fn from(r: ImageRecord) -> Self {
        ProductImage {
            id: ImageId::new(r.id),
            product_id: ProductId::new(r.product_id),
            url: r.url,
        }
    }
}

impl TryFrom<PriceHistoryRecord> for PriceHistoryEntry {
    type Error = StoreError;

    fn try_from(r: PriceHistoryRecord) -> Result<Self, Self::Error> {
        Ok(PriceHistoryEntry {
            id: PriceHistoryId::new(r.id),
            product_id: ProductId::new(r.product_id),
            price: stored_price(r.price)?,
            timestamp: from_micros(r.recorded_at)?,
        })
    }
}

impl From<CategoryRecord> for Category {
    fn from(r: CategoryRecord) -> Self {
        Category {
            id: CategoryId::new(r.id),
            name: r.name,
        }
    }
}

impl From<ProductTypeRecord> for ProductType {
    fn from(r: ProductTypeRecord) -> Self {
        ProductType {
            id: ProductTypeId::new(r.id),
            category_id: CategoryId::new(r.category_id),
            name: r.name,
        }
    }
}

// -------------------------
// Products
// -------------------------

/// Insert a product row. `None` means the referenced product type does not exist.
pub(crate) async fn insert_product(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
    price: Price,
    product_type_id: Option<ProductTypeId>,
) -> StoreResult<Option<ProductId>> {
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO products (name, description, price, product_type_id)
        SELECT ?1, ?2, ?3, ?4
        WHERE ?4 IS NULL OR EXISTS (SELECT 1 FROM product_types WHERE id = ?4)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(price.amount())
    .bind(product_type_id.map(|t| t.get()))
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_product", e))?;

    Ok(id.map(ProductId::new))
}

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: ProductId,
) -> StoreResult<Option<Product>> {
    let record: Option<ProductRecord> = sqlx::query_as(
        r#"
        SELECT id, name, description, price, product_type_id
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id.get())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_product", e))?;

    let Some(record) = record else {
        return Ok(None);
    };
    let images = fetch_images(conn, id).await?;
    record.into_product(images).map(Some)
}

pub(crate) async fn fetch_all_products(conn: &mut SqliteConnection) -> StoreResult<Vec<Product>> {
    let records: Vec<ProductRecord> = sqlx::query_as(
        r#"
        SELECT id, name, description, price, product_type_id
        FROM products
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_all_products", e))?;

    let images: Vec<ImageRecord> = sqlx::query_as(
        r#"
        SELECT id, product_id, url
        FROM product_images
        ORDER BY product_id ASC, id ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_all_images", e))?;

    let mut images = images.into_iter().map(ProductImage::from).peekable();
    let mut products = Vec::with_capacity(records.len());
    for record in records {
        let pid = ProductId::new(record.id);
        let mut own = Vec::new();
        // Both sides are sorted by product id; drain the matching run.
        while let Some(img) = images.next_if(|i| i.product_id <= pid) {
            if img.product_id == pid {
                own.push(img);
            }
        }
        products.push(record.into_product(own)?);
    }
    Ok(products)
}

/// Take the write lock on a product row and return its current price.
///
/// `None` means the product does not exist.
pub(crate) async fn lock_product_price(
    conn: &mut SqliteConnection,
    id: ProductId,
) -> StoreResult<Option<Price>> {
    let price: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products SET price = price
        WHERE id = ?1
        RETURNING price
        "#,
    )
    .bind(id.get())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("lock_product_price", e))?;

    price.map(stored_price).transpose()
}

pub(crate) async fn set_product_price(
    conn: &mut SqliteConnection,
    id: ProductId,
    price: Price,
) -> StoreResult<()> {
    sqlx::query("UPDATE products SET price = ?1 WHERE id = ?2")
        .bind(price.amount())
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("set_product_price", e))?;
    Ok(())
}

/// Returns `false` if no such product existed.
pub(crate) async fn delete_product(conn: &mut SqliteConnection, id: ProductId) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete_product", e))?;
    Ok(result.rows_affected() > 0)
}

// -------------------------
// Images
// -------------------------

/// Insert an image for an existing product. `None` means the product does not exist.
pub(crate) async fn insert_image(
    conn: &mut SqliteConnection,
    product_id: ProductId,
    url: &str,
) -> StoreResult<Option<ProductImage>> {
    let record: Option<ImageRecord> = sqlx::query_as(
        r#"
        INSERT INTO product_images (product_id, url)
        SELECT id, ?2 FROM products WHERE id = ?1
        RETURNING id, product_id, url
        "#,
    )
    .bind(product_id.get())
    .bind(url)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_image", e))?;

    Ok(record.map(ProductImage::from))
}

pub(crate) async fn fetch_images(
    conn: &mut SqliteConnection,
    product_id: ProductId,
) -> StoreResult<Vec<ProductImage>> {
    let records: Vec<ImageRecord> = sqlx::query_as(
        r#"
        SELECT id, product_id, url
        FROM product_images
        WHERE product_id = ?1
        ORDER BY id ASC
        "#,
    )
    .bind(product_id.get())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_images", e))?;

    Ok(records.into_iter().map(ProductImage::from).collect())
}

// -------------------------
// Price history
// -------------------------

/// Append a history row, clamping its timestamp so it never precedes the
/// product's previous entry.
pub(crate) async fn append_price_history(
    conn: &mut SqliteConnection,
    product_id: ProductId,
    price: Price,
    now: DateTime<Utc>,
) -> StoreResult<PriceHistoryEntry> {
    let record: PriceHistoryRecord = sqlx::query_as(
        r#"
        INSERT INTO price_history (product_id, price, recorded_at)
        VALUES (
            ?1,
            ?2,
            MAX(?3, COALESCE((SELECT MAX(recorded_at) FROM price_history WHERE product_id = ?1), ?3))
        )
        RETURNING id, product_id, price, recorded_at
        "#,
    )
    .bind(product_id.get())
    .bind(price.amount())
    .bind(to_micros(now))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("append_price_history", e))?;

    record.try_into()
}

pub(crate) async fn fetch_price_history(
    conn: &mut SqliteConnection,
    product_id: ProductId,
) -> StoreResult<Vec<PriceHistoryEntry>> {
    let records: Vec<PriceHistoryRecord> = sqlx::query_as(
        r#"
        SELECT id, product_id, price, recorded_at
        FROM price_history
        WHERE product_id = ?1
        ORDER BY recorded_at ASC, id ASC
        "#,
    )
    .bind(product_id.get())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_price_history", e))?;

    records.into_iter().map(PriceHistoryEntry::try_from).collect()
}

// -------------------------
// Taxonomy
// -------------------------

pub(crate) async fn insert_category(conn: &mut SqliteConnection, name: &str) -> StoreResult<Category> {
    let record: CategoryRecord =
        sqlx::query_as("INSERT INTO categories (name) VALUES (?1) RETURNING id, name")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("insert_category", e))?;
    Ok(record.into())
}

pub(crate) async fn fetch_categories(conn: &mut SqliteConnection) -> StoreResult<Vec<Category>> {
    let records: Vec<CategoryRecord> =
        sqlx::query_as("SELECT id, name FROM categories ORDER BY id ASC")
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("fetch_categories", e))?;
    Ok(records.into_iter().map(Category::from).collect())
}

/// `None` means the category does not exist.
pub(crate) async fn insert_product_type(
    conn: &mut SqliteConnection,
    category_id: CategoryId,
    name: &str,
) -> StoreResult<Option<ProductType>> {
    let record: Option<ProductTypeRecord> = sqlx::query_as(
        r#"
        INSERT INTO product_types (category_id, name)
        SELECT id, ?2 FROM categories WHERE id = ?1
        RETURNING id, category_id, name
        "#,
    )
    .bind(category_id.get())
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_product_type", e))?;
    Ok(record.map(ProductType::from))
}

pub(crate) async fn category_exists(
    conn: &mut SqliteConnection,
    category_id: CategoryId,
) -> StoreResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?1")
        .bind(category_id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("category_exists", e))?;
    Ok(found.is_some())
}

pub(crate) async fn fetch_product_types(
    conn: &mut SqliteConnection,
    category_id: CategoryId,
) -> StoreResult<Vec<ProductType>> {
    let records: Vec<ProductTypeRecord> = sqlx::query_as(
        r#"
        SELECT id, category_id, name
        FROM product_types
        WHERE category_id = ?1
        ORDER BY id ASC
        "#,
    )
    .bind(category_id.get())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("fetch_product_types", e))?;
    Ok(records.into_iter().map(ProductType::from).collect())
}
