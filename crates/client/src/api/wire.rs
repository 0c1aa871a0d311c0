//! Request and response bodies of the account service.

use addressbook_core::{AddressFields, AddressId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub token: String,
}

/// Body of every non-2xx response: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub error: String,
}

/// Reply to `PUT /user/address/{id}`.
///
/// The service echoes the bound request model, whose id may be missing or
/// zero; the id of the request is authoritative in that case.
#[derive(Debug, Deserialize)]
pub(super) struct AddressReply {
    #[serde(default)]
    pub address_id: Option<AddressId>,
    #[serde(flatten)]
    pub fields: AddressFields,
}

impl AddressReply {
    pub fn id_or(&self, requested: AddressId) -> AddressId {
        self.address_id
            .filter(|id| id.as_u64() != 0)
            .unwrap_or(requested)
    }
}
