use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, ImageId, ProductId, ProductTypeId};

/// Price in the smallest currency unit (e.g. cents).
///
/// Always non-negative once constructed through [`Price::new`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub fn new(amount: i64) -> DomainResult<Self> {
        if amount < 0 {
            return Err(DomainError::validation(format!(
                "price cannot be negative (got {amount})"
            )));
        }
        Ok(Self(amount))
    }

    pub const fn amount(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Price {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// An image URL attached to exactly one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    pub url: String,
}

/// Fully hydrated product: images are always populated by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub product_type_id: Option<ProductTypeId>,
    pub images: Vec<ProductImage>,
}

impl Product {
    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|i| i.url.as_str())
    }
}

/// Input for a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    pub url: String,
}

impl NewImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.url.trim().is_empty() {
            return Err(DomainError::validation("image url cannot be empty"));
        }
        Ok(())
    }
}

/// Input for product creation (product + its initial image set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub product_type_id: Option<ProductTypeId>,
    pub images: Vec<NewImage>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            product_type_id: None,
            images: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_product_type(mut self, product_type_id: ProductTypeId) -> Self {
        self.product_type_id = Some(product_type_id);
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(NewImage::new(url));
        self
    }

    /// Validate the whole input and return the checked price.
    ///
    /// Nothing is persisted unless this passes, so a product is never stored
    /// with only part of its image set.
    pub fn validate(&self) -> DomainResult<Price> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let price = Price::new(self.price)?;
        for image in &self.images {
            image.validate()?;
        }
        Ok(price)
    }
}
