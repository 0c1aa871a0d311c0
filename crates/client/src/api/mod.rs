//! Remote account service adapter.
//!
//! Each method maps to exactly one HTTP call:
//!
//! | Method           | Request                         | Auth   |
//! |------------------|---------------------------------|--------|
//! | `login`          | `POST /login`                   | none   |
//! | `register`       | `POST /register`                | none   |
//! | `get_user`       | `GET /user`                     | bearer |
//! | `update_user`    | `PUT /user`                     | bearer |
//! | `delete_user`    | `DELETE /user`                  | bearer |
//! | `create_address` | `POST /user/address`            | bearer |
//! | `update_address` | `PUT /user/address/{id}`        | bearer |
//! | `delete_address` | `DELETE /user/address/{id}`     | bearer |
//!
//! Any non-2xx status is a [`ClientError::Rejected`]; the status code is
//! never used to choose behavior.

mod http;
mod wire;

pub use http::HttpAccountApi;

use addressbook_core::{Address, AddressFields, AddressId, ProfileUpdate, SessionToken, User};

use crate::auth::{Credentials, Registration};
use crate::error::ClientError;

/// Operations offered by the remote account service.
///
/// Implemented over HTTP by [`HttpAccountApi`]; tests substitute an
/// in-memory double.
#[trait_variant::make(AccountApi: Send)]
pub trait LocalAccountApi {
    /// Exchange credentials for a session token.
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, ClientError>;

    /// Create a new account.
    async fn register(&self, registration: &Registration) -> Result<(), ClientError>;

    /// Fetch the user with embedded addresses.
    async fn get_user(&self, token: &SessionToken) -> Result<User, ClientError>;

    /// Change name and email; returns the values the service stored.
    async fn update_user(
        &self,
        token: &SessionToken,
        profile: &ProfileUpdate,
    ) -> Result<ProfileUpdate, ClientError>;

    /// Delete the account.
    async fn delete_user(&self, token: &SessionToken) -> Result<(), ClientError>;

    /// Create an address; the service assigns its id.
    async fn create_address(
        &self,
        token: &SessionToken,
        fields: &AddressFields,
    ) -> Result<Address, ClientError>;

    /// Replace the fields of an address.
    async fn update_address(
        &self,
        token: &SessionToken,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, ClientError>;

    /// Delete an address.
    async fn delete_address(&self, token: &SessionToken, id: AddressId)
    -> Result<(), ClientError>;
}
