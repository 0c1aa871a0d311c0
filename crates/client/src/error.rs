//! Error types for the address book client.
//!
//! Every operation returns `Result<T, ClientError>`. The core never retries
//! and never rolls back: an `Err` always means the local cache is exactly as
//! it was before the call.

use addressbook_core::{AddressId, EmailError, UnknownAddressField};
use thiserror::Error;

/// Coarse failure classes presented to the UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No response was received.
    NetworkFailure,
    /// The service answered with a non-2xx status.
    RejectedByServer,
    /// The caller broke a precondition; no request was sent.
    PreconditionViolation,
    /// A 2xx response whose body could not be used.
    InvalidResponse,
    /// The response arrived after the session it belonged to had ended.
    SessionChanged,
}

/// Errors that can occur in the address book client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or no response was received.
    #[error("network failure: {0}")]
    Network(String),

    /// The service answered with a non-2xx status.
    ///
    /// The status is kept for display only; callers must not branch on it.
    #[error("rejected by server ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// The service's `error` message, or the raw body.
        message: String,
    },

    /// A success response whose body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The operation was refused locally before any network call.
    #[error("precondition violated: {0}")]
    Precondition(#[from] Precondition),

    /// User input failed client-side validation before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The response belonged to a session that has since ended; it was
    /// discarded without touching the cache.
    #[error("session changed while the request was in flight")]
    SessionChanged,

    /// An endpoint URL could not be built from the configured base.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ClientError {
    /// Classify the error for presentation.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) | Self::Endpoint(_) => FailureKind::NetworkFailure,
            Self::Rejected { .. } => FailureKind::RejectedByServer,
            Self::InvalidResponse(_) => FailureKind::InvalidResponse,
            Self::Precondition(_) | Self::InvalidInput(_) => FailureKind::PreconditionViolation,
            Self::SessionChanged => FailureKind::SessionChanged,
        }
    }

    /// Whether this is a precondition failure (nothing was sent).
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self.kind(), FailureKind::PreconditionViolation)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Broken caller preconditions on the session, cache and form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    /// No session token is present.
    #[error("not authenticated")]
    Unauthenticated,

    /// The token does not belong to the session the cache was loaded for.
    #[error("token does not match the loaded session")]
    TokenMismatch,

    /// The cache holds no user for the session.
    #[error("no user loaded for this session")]
    NotLoaded,

    /// The referenced address is not in the cache.
    #[error("address {0} is not in the cache")]
    UnknownAddress(AddressId),

    /// A form action was issued while no address form is open.
    #[error("no address form is open")]
    FormClosed,
}

/// Client-side validation failures of login, registration and profile input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Name is empty.
    #[error("name must not be empty")]
    EmptyName,

    /// Password is empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// Email is malformed.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    /// Address field name is not recognised.
    #[error(transparent)]
    Field(#[from] UnknownAddressField),
}
