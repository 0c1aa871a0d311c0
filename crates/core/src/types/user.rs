//! User account records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::address::Address;
use super::id::{AddressId, UserId};

/// The authenticated user, as returned by `GET /user`.
///
/// The remote service embeds the user's addresses; their order is the
/// server's and is preserved as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    #[serde(rename = "ID")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email as stored by the service.
    pub email: String,
    /// Addresses owned by the user. `null` or absent means none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub addresses: Vec<Address>,
    /// Soft-deletion timestamp, if the account has been deleted.
    #[serde(rename = "DeletedAt", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Find an address by id.
    #[must_use]
    pub fn address(&self, id: AddressId) -> Option<&Address> {
        self.addresses.iter().find(|address| address.id == id)
    }

    /// Whether an address with this id is present.
    #[must_use]
    pub fn has_address(&self, id: AddressId) -> bool {
        self.address(id).is_some()
    }

    /// The editable profile fields of this user.
    #[must_use]
    pub fn profile(&self) -> ProfileUpdate {
        ProfileUpdate {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Name and email, the mutable profile fields of a [`User`].
///
/// Used both as the body of `PUT /user` and to read the service's reply,
/// which may echo only these two fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Account email.
    #[serde(default)]
    pub email: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Address>>::deserialize(deserializer)?.unwrap_or_default())
}
