//! Parsing of `Authorization` header values.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::authenticator::AuthError;

/// Credentials presented by a caller.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

impl Credentials {
    /// Parse a raw `Authorization` header value.
    ///
    /// Accepts `Bearer <token>` and `Basic <base64(username:password)>`. The
    /// scheme name is matched case-insensitively.
    pub fn parse(header: &str) -> Result<Self, AuthError> {
        let header = header.trim();
        let (scheme, rest) = header
            .split_once(' ')
            .ok_or_else(|| AuthError::Malformed("missing authorization scheme".to_string()))?;
        let rest = rest.trim();

        if scheme.eq_ignore_ascii_case("bearer") {
            if rest.is_empty() {
                return Err(AuthError::Malformed("empty bearer token".to_string()));
            }
            return Ok(Credentials::Bearer(rest.to_string()));
        }

        if scheme.eq_ignore_ascii_case("basic") {
            let decoded = STANDARD
                .decode(rest)
                .map_err(|e| AuthError::Malformed(format!("invalid base64: {e}")))?;
            let decoded = String::from_utf8(decoded)
                .map_err(|_| AuthError::Malformed("credentials are not utf-8".to_string()))?;
            let (username, password) = decoded
                .split_once(':')
                .ok_or_else(|| AuthError::Malformed("missing ':' separator".to_string()))?;
            if username.is_empty() {
                return Err(AuthError::Malformed("empty username".to_string()));
            }
            return Ok(Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            });
        }

        Err(AuthError::Malformed(format!(
            "unsupported authorization scheme '{scheme}'"
        )))
    }
}
