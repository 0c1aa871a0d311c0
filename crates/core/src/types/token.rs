//! Session bearer token.

use secrecy::{ExposeSecret, SecretString};

/// Errors that can occur when constructing a [`SessionToken`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token is empty or whitespace only.
    #[error("session token cannot be empty")]
    Empty,
}

/// Opaque bearer credential identifying an authenticated session.
///
/// The value is issued by the remote service and is never inspected by the
/// client. It is held in a [`SecretString`] so that `Debug` output and logs
/// never contain it; call [`SessionToken::expose`] only where the raw value
/// is sent or persisted.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wrap a token received from the service or read from the session store.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Empty`] if the value is blank. A blank token is
    /// never a valid session.
    pub fn new(value: impl Into<String>) -> Result<Self, TokenError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TokenError::Empty);
        }
        Ok(Self(SecretString::from(value)))
    }

    /// The raw token, for the `Authorization` header and the session store.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SessionToken {}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}
