use catalog_auth::{AuthMethod, AuthenticatedPrincipal};
use catalog_core::UserId;

/// Principal context for a request (authenticated identity).
///
/// Inserted by the auth middleware only when credentials were presented and
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: AuthenticatedPrincipal,
}

impl PrincipalContext {
    pub fn new(principal: AuthenticatedPrincipal) -> Self {
        Self { principal }
    }

    pub fn subject(&self) -> &str {
        &self.principal.subject
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.principal.user_id
    }

    pub fn method(&self) -> AuthMethod {
        self.principal.method
    }
}
