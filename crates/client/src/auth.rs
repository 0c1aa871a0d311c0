//! Login and registration input.
//!
//! Both forms are validated locally so an obviously incomplete submission
//! never reaches the service.

use addressbook_core::Email;
use secrecy::{ExposeSecret, SecretString};

use crate::error::InputError;

/// Email and password for `POST /login`.
#[derive(Clone)]
pub struct Credentials {
    email: Email,
    password: SecretString,
}

impl Credentials {
    /// Validate login input.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] if the email is malformed or the password is
    /// empty.
    pub fn new(email: &str, password: impl Into<String>) -> Result<Self, InputError> {
        let email = Email::parse(email)?;
        let password = non_empty_password(password.into())?;
        Ok(Self { email, password })
    }

    /// The login email.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Name, email and password for `POST /register`.
#[derive(Clone)]
pub struct Registration {
    name: String,
    email: Email,
    password: SecretString,
}

impl Registration {
    /// Validate registration input: name, email and password must all be
    /// present.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError`] found, checking name, then email,
    /// then password.
    pub fn new(
        name: &str,
        email: &str,
        password: impl Into<String>,
    ) -> Result<Self, InputError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InputError::EmptyName);
        }
        let email = Email::parse(email)?;
        let password = non_empty_password(password.into())?;

        Ok(Self {
            name: name.to_owned(),
            email,
            password,
        })
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The account email.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn non_empty_password(password: String) -> Result<SecretString, InputError> {
    // Passwords are sent as typed; only emptiness is checked.
    if password.is_empty() {
        return Err(InputError::EmptyPassword);
    }
    Ok(SecretString::from(password))
}
