use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::UserId;

use crate::credentials::Credentials;
use crate::password::verify_password;
use crate::principal::AuthenticatedPrincipal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("malformed credentials: {0}")]
    Malformed(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    /// The credential source itself failed (storage down, corrupt hash).
    #[error("authentication backend error: {0}")]
    Backend(String),
}

/// A stored credential record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

/// Source of user credential records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, AuthError>;
}

#[async_trait]
impl<T> UserDirectory for Arc<T>
where
    T: UserDirectory + ?Sized,
{
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        (**self).find_user(username).await
    }
}

/// Verifies presented credentials.
///
/// Implementations return `InvalidCredentials` for credential kinds they do not
/// handle, so they can be chained.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials)
    -> Result<AuthenticatedPrincipal, AuthError>;
}

/// Shared-secret bearer token check.
pub struct StaticTokenAuthenticator {
    token: String,
    subject: String,
}

impl StaticTokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: "api-token".to_string(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        match credentials {
            Credentials::Bearer(token) if constant_time_eq(token.as_bytes(), self.token.as_bytes()) => {
                Ok(AuthenticatedPrincipal::service(self.subject.clone()))
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

/// Basic-auth check against stored user records.
pub struct UserCredentialAuthenticator<D> {
    directory: D,
}

impl<D: UserDirectory> UserCredentialAuthenticator<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl<D: UserDirectory> Authenticator for UserCredentialAuthenticator<D> {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        let Credentials::Basic { username, password } = credentials else {
            return Err(AuthError::InvalidCredentials);
        };

        let Some(record) = self.directory.find_user(username).await? else {
            tracing::debug!(username = %username, "unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if verify_password(&record.password_hash, password)? {
            Ok(AuthenticatedPrincipal::user(record.id, record.username))
        } else {
            tracing::debug!(username = %username, "password mismatch");
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Tries each authenticator in order; the first success wins.
#[derive(Clone, Default)]
pub struct AuthChain {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl AuthChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticators.push(authenticator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }

    pub fn len(&self) -> usize {
        self.authenticators.len()
    }
}

#[async_trait]
impl Authenticator for AuthChain {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        for authenticator in &self.authenticators {
            match authenticator.authenticate(credentials).await {
                Ok(principal) => return Ok(principal),
                Err(AuthError::InvalidCredentials) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(AuthError::InvalidCredentials)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;
    use crate::principal::AuthMethod;

    struct FixedDirectory(Vec<UserRecord>);

    #[async_trait]
    impl UserDirectory for FixedDirectory {
        async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
            Ok(self.0.iter().find(|u| u.username == username).cloned())
        }
    }

    struct BrokenDirectory;

    #[async_trait]
    impl UserDirectory for BrokenDirectory {
        async fn find_user(&self, _username: &str) -> Result<Option<UserRecord>, AuthError> {
            Err(AuthError::Backend("database unavailable".to_string()))
        }
    }

    fn directory_with_admin() -> FixedDirectory {
        FixedDirectory(vec![UserRecord {
            id: UserId::new(1),
            username: "admin".to_string(),
            password_hash: hash_password("s3cret").unwrap(),
        }])
    }

    fn basic(username: &str, password: &str) -> Credentials {
        Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn static_token_accepts_only_exact_token() {
        let auth = StaticTokenAuthenticator::new("tok-123");

        let principal = auth
            .authenticate(&Credentials::Bearer("tok-123".to_string()))
            .await
            .unwrap();
        assert_eq!(principal.method, AuthMethod::StaticToken);

        for wrong in ["tok-12", "tok-1234", "TOK-123"] {
            let err = auth
                .authenticate(&Credentials::Bearer(wrong.to_string()))
                .await
                .unwrap_err();
            assert_eq!(err, AuthError::InvalidCredentials);
        }
        assert_eq!(
            auth.authenticate(&basic("admin", "tok-123")).await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn user_credentials_are_checked_against_directory() {
        let auth = UserCredentialAuthenticator::new(directory_with_admin());

        let principal = auth.authenticate(&basic("admin", "s3cret")).await.unwrap();
        assert_eq!(principal.subject, "admin");
        assert_eq!(principal.user_id, Some(UserId::new(1)));

        assert_eq!(
            auth.authenticate(&basic("admin", "nope")).await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            auth.authenticate(&basic("ghost", "s3cret")).await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn chain_falls_through_to_next_authenticator() {
        let chain = AuthChain::new()
            .with(Arc::new(StaticTokenAuthenticator::new("tok")))
            .with(Arc::new(UserCredentialAuthenticator::new(directory_with_admin())));

        assert_eq!(chain.len(), 2);
        assert!(chain.authenticate(&Credentials::Bearer("tok".to_string())).await.is_ok());
        assert!(chain.authenticate(&basic("admin", "s3cret")).await.is_ok());
        assert_eq!(
            chain.authenticate(&basic("admin", "bad")).await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn chain_surfaces_backend_failures() {
        let chain = AuthChain::new().with(Arc::new(UserCredentialAuthenticator::new(BrokenDirectory)));
        assert!(matches!(
            chain.authenticate(&basic("admin", "pw")).await,
            Err(AuthError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn empty_chain_rejects_everything() {
        let chain = AuthChain::new();
        assert!(chain.is_empty());
        assert_eq!(
            chain.authenticate(&Credentials::Bearer("x".to_string())).await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }
}
