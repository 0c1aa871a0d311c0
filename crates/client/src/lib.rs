//! Address book client.
//!
//! Client-side state for one authenticated user of the remote account
//! service:
//!
//! - [`session`] - the persisted session token
//! - [`cache`] - the fire-and-confirm cache of the user and their addresses
//! - [`form`] - the add/edit address form state machine
//! - [`view`] - the account view tying the three together for a shell
//! - [`api`] - the service adapter trait and its HTTP implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use addressbook_client::{AccountView, ClientConfig, FileSessionStore, HttpAccountApi};
//!
//! let config = ClientConfig::from_env()?;
//! let view = AccountView::new(
//!     HttpAccountApi::new(&config),
//!     FileSessionStore::new(&config.session_file),
//! );
//!
//! if let Some(user) = view.start().await? {
//!     println!("{} has {} addresses", user.name, user.addresses.len());
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod form;
pub mod session;
pub mod view;

#[cfg(test)]
mod test_support;

pub use api::{AccountApi, HttpAccountApi, LocalAccountApi};
pub use auth::{Credentials, Registration};
pub use cache::{AddressCache, AddressChange, CacheState};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, FailureKind, InputError, Precondition};
pub use form::{FormController, FormDraft, FormMode, Submission, SubmissionTarget};
pub use session::{FileSessionStore, MemorySessionStore, SessionController, SessionStore};
pub use view::{AccountSnapshot, AccountView};
