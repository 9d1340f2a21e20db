use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use catalog_core::ProductId;
use catalog_products::NewImage;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product).delete(delete_product))
        .route("/:id/price", put(update_product_price))
        .route("/:id/price_history", get(get_price_history))
        .route("/:id/images", post(add_product_image))
}

fn parse_product_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse().map_err(|_| errors::invalid_id("product"))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.store.create_product(body.into_new_product()).await {
        Ok(product) => (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.list_products().await {
        Ok(products) => {
            let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(Value::Array(items))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store.get_product(id).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// `PUT /products/:id/price?new_price=<int>`; a JSON body `{"new_price": <int>}`
/// is used when the query parameter is absent.
pub async fn update_product_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::UpdatePriceRequest>,
    body: Bytes,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let raw = match query.new_price {
        Some(v) => v,
        None => match price_from_body(&body) {
            Ok(v) => v,
            Err(resp) => return resp,
        },
    };
    let new_price = match parse_price(&raw) {
        Some(p) => p,
        None => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "new_price must be an integer",
            );
        }
    };

    match services.store.update_product_price(id, new_price).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn price_from_body(body: &[u8]) -> Result<Value, axum::response::Response> {
    let missing = || {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "new_price is required",
        )
    };
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(missing());
    }
    let parsed: dto::UpdatePriceRequest = serde_json::from_slice(body)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.to_string()))?;
    parsed.new_price.ok_or_else(missing)
}

fn parse_price(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub async fn get_price_history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store.get_price_history(id).await {
        Ok(entries) => {
            let items = entries.iter().map(dto::history_entry_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(Value::Array(items))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.store.delete_product(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Product deleted successfully" })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn add_product_image(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ImageRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.store.add_product_image(id, NewImage::new(body.url)).await {
        Ok(image) => (StatusCode::CREATED, Json(dto::image_to_json(&image))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_price(&json!(1200)), Some(1200));
        assert_eq!(parse_price(&json!(" 42 ")), Some(42));
        assert_eq!(parse_price(&json!(-3)), Some(-3));
        assert_eq!(parse_price(&json!(12.5)), None);
        assert_eq!(parse_price(&json!("abc")), None);
        assert_eq!(parse_price(&Value::Null), None);
    }

    #[test]
    fn body_fallback_requires_new_price() {
        assert!(price_from_body(b"").is_err());
        assert!(price_from_body(b"{}").is_err());
        assert!(price_from_body(b"not json").is_err());
        assert_eq!(price_from_body(br#"{"new_price": 9}"#).ok(), Some(json!(9)));
    }
}
