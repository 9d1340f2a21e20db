use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use catalog_auth::{AuthChain, AuthError, Authenticator, Credentials};

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub chain: Arc<AuthChain>,
}

/// Authenticate requests that carry credentials; require them for writes.
///
/// Reads are public. Presented credentials are always checked, so a bad header
/// is rejected even on a read. With an empty chain writes are left open.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let credentials = match extract_credentials(req.headers()) {
        Ok(c) => c,
        Err(e) => return auth_error_to_response(e),
    };

    match credentials {
        Some(credentials) => match state.chain.authenticate(&credentials).await {
            Ok(principal) => {
                tracing::debug!(subject = %principal.subject, "request authenticated");
                req.extensions_mut().insert(PrincipalContext::new(principal));
            }
            Err(e) => return auth_error_to_response(e),
        },
        None if is_mutating(req.method()) && !state.chain.is_empty() => {
            return auth_error_to_response(AuthError::MissingCredentials);
        }
        None => {}
    }

    next.run(req).await
}

fn is_mutating(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn extract_credentials(headers: &HeaderMap) -> Result<Option<Credentials>, AuthError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| AuthError::Malformed("authorization header is not ASCII".to_string()))?;
    Credentials::parse(header).map(Some)
}

fn auth_error_to_response(err: AuthError) -> Response {
    match err {
        AuthError::Backend(msg) => {
            tracing::error!(error = %msg, "authentication backend failure");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth_backend_error",
                "authentication is temporarily unavailable",
            )
        }
        other => errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", other.to_string()),
    }
}
