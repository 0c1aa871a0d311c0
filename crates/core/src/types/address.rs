//! Postal address records.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// The seven editable fields of a postal address.
///
/// This is the request body of both create and update calls and the content
/// of an address form draft. Missing keys in a server response deserialize as
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressFields {
    /// Country.
    pub country: String,
    /// City.
    pub city: String,
    /// Street name.
    pub street: String,
    /// House or building number.
    pub number: String,
    /// Apartment, suite, floor.
    pub complement: String,
    /// State or province.
    pub state: String,
    /// Postal code.
    pub zipcode: String,
}

impl AddressFields {
    /// Read one field by name.
    #[must_use]
    pub fn get(&self, field: AddressField) -> &str {
        match field {
            AddressField::Country => &self.country,
            AddressField::City => &self.city,
            AddressField::Street => &self.street,
            AddressField::Number => &self.number,
            AddressField::Complement => &self.complement,
            AddressField::State => &self.state,
            AddressField::Zipcode => &self.zipcode,
        }
    }

    /// Overwrite one field by name.
    pub fn set(&mut self, field: AddressField, value: impl Into<String>) {
        let slot = match field {
            AddressField::Country => &mut self.country,
            AddressField::City => &mut self.city,
            AddressField::Street => &mut self.street,
            AddressField::Number => &mut self.number,
            AddressField::Complement => &mut self.complement,
            AddressField::State => &mut self.state,
            AddressField::Zipcode => &mut self.zipcode,
        };
        *slot = value.into();
    }

    /// Whether every field is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        AddressField::ALL
            .iter()
            .all(|field| self.get(*field).trim().is_empty())
    }

    /// Format the address as a single line, in postal order, skipping empty
    /// parts.
    #[must_use]
    pub fn formatted_single_line(&self) -> String {
        [
            &self.street,
            &self.number,
            &self.complement,
            &self.city,
            &self.state,
            &self.zipcode,
            &self.country,
        ]
        .into_iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Name of one editable address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Country,
    City,
    Street,
    Number,
    Complement,
    State,
    Zipcode,
}

impl AddressField {
    /// Every field, in form display order.
    pub const ALL: [Self; 7] = [
        Self::Street,
        Self::Number,
        Self::Complement,
        Self::City,
        Self::State,
        Self::Zipcode,
        Self::Country,
    ];

    /// The wire and form name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::City => "city",
            Self::Street => "street",
            Self::Number => "number",
            Self::Complement => "complement",
            Self::State => "state",
            Self::Zipcode => "zipcode",
        }
    }
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field name that is not one of the seven address fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown address field: {0}")]
pub struct UnknownAddressField(pub String);

impl std::str::FromStr for AddressField {
    type Err = UnknownAddressField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAddressField(s.to_owned()))
    }
}

/// A postal address owned by the current user.
///
/// The id is assigned by the remote service on creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Server-assigned identifier.
    #[serde(rename = "address_id")]
    pub id: AddressId,
    /// Editable content.
    #[serde(flatten)]
    pub fields: AddressFields,
}

impl Address {
    /// Create an address record from its parts.
    #[must_use]
    pub const fn new(id: AddressId, fields: AddressFields) -> Self {
        Self { id, fields }
    }
}
