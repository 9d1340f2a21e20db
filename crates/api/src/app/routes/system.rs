use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(principal: Option<Extension<PrincipalContext>>) -> axum::response::Response {
    match principal {
        Some(Extension(principal)) => Json(dto::principal_to_json(&principal)).into_response(),
        None => errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing credentials"),
    }
}
