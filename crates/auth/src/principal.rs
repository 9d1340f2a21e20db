use serde::Serialize;

use catalog_core::UserId;

/// How a principal proved its identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    StaticToken,
    UserCredentials,
}

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedPrincipal {
    /// Username for credential logins, a fixed service name for token logins.
    pub subject: String,
    pub user_id: Option<UserId>,
    pub method: AuthMethod,
}

impl AuthenticatedPrincipal {
    pub fn service(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            user_id: None,
            method: AuthMethod::StaticToken,
        }
    }

    pub fn user(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            subject: username.into(),
            user_id: Some(user_id),
            method: AuthMethod::UserCredentials,
        }
    }
}
