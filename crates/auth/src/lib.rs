//! `catalog-auth`: authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: the API layer
//! hands it a raw `Authorization` header value, and credential records come
//! from whatever implements [`UserDirectory`].

pub mod authenticator;
pub mod credentials;
pub mod password;
pub mod principal;

pub use authenticator::{
    AuthChain, AuthError, Authenticator, StaticTokenAuthenticator, UserCredentialAuthenticator,
    UserDirectory, UserRecord,
};
pub use credentials::Credentials;
pub use password::{hash_password, verify_password};
pub use principal::{AuthMethod, AuthenticatedPrincipal};
