use serde::Deserialize;
use serde_json::{Value, json};

use catalog_auth::AuthMethod;
use catalog_products::{
    Category, NewImage, NewProduct, PriceHistoryEntry, Product, ProductImage, ProductType,
};

use crate::context::PrincipalContext;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub product_type_id: Option<i64>,
    #[serde(default)]
    pub images: Vec<ImageRequest>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            price: self.price,
            product_type_id: self.product_type_id.map(Into::into),
            images: self.images.into_iter().map(|i| NewImage::new(i.url)).collect(),
        }
    }
}

/// Price update parameters; accepted from the query string or a JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePriceRequest {
    pub new_price: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductTypeRequest {
    pub name: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn image_to_json(image: &ProductImage) -> Value {
    json!({
        "id": image.id.get(),
        "url": image.url,
    })
}

pub fn product_to_json(product: &Product) -> Value {
    json!({
        "id": product.id.get(),
        "name": product.name,
        "description": product.description,
        "price": product.price.amount(),
        "product_type_id": product.product_type_id.map(|t| t.get()),
        "images": product.images.iter().map(image_to_json).collect::<Vec<_>>(),
    })
}

pub fn history_entry_to_json(entry: &PriceHistoryEntry) -> Value {
    json!({
        "id": entry.id.get(),
        "product_id": entry.product_id.get(),
        "price": entry.price.amount(),
        "timestamp": entry.timestamp.to_rfc3339(),
    })
}

pub fn category_to_json(category: &Category) -> Value {
    json!({
        "id": category.id.get(),
        "name": category.name,
    })
}

pub fn product_type_to_json(product_type: &ProductType) -> Value {
    json!({
        "id": product_type.id.get(),
        "category_id": product_type.category_id.get(),
        "name": product_type.name,
    })
}

pub fn principal_to_json(principal: &PrincipalContext) -> Value {
    let method = match principal.method() {
        AuthMethod::StaticToken => "static_token",
        AuthMethod::UserCredentials => "user_credentials",
    };
    json!({
        "subject": principal.subject(),
        "user_id": principal.user_id().map(|id| id.get()),
        "method": method,
    })
}

#[cfg(test)]
mod tests {
    use catalog_core::{ImageId, ProductId};
    use catalog_products::Price;

    use super::*;

    #[test]
    fn product_json_has_wire_fields() {
        let id = ProductId::new(7);
        let product = Product {
            id,
            name: "Kettle".to_string(),
            description: None,
            price: Price::new(2500).unwrap(),
            product_type_id: None,
            images: vec![ProductImage {
                id: ImageId::new(1),
                product_id: id,
                url: "k.jpg".to_string(),
            }],
        };

        let v = product_to_json(&product);
        assert_eq!(v["id"], 7);
        assert_eq!(v["price"], 2500);
        assert!(v["description"].is_null());
        assert_eq!(v["images"], json!([{ "id": 1, "url": "k.jpg" }]));
    }

    #[test]
    fn create_request_defaults_optional_fields() {
        let req: CreateProductRequest =
            serde_json::from_value(json!({ "name": "Mug", "price": 300 })).unwrap();
        let new = req.into_new_product();
        assert_eq!(new.name, "Mug");
        assert!(new.images.is_empty());
        assert_eq!(new.product_type_id, None);
    }
}
