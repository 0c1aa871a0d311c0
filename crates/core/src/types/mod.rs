//! Core types for the address book.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the client state machines and the remote service wire format.

pub mod address;
pub mod email;
pub mod id;
pub mod token;
pub mod user;

pub use address::{Address, AddressField, AddressFields, UnknownAddressField};
pub use email::{Email, EmailError};
pub use id::*;
pub use token::{SessionToken, TokenError};
pub use user::{ProfileUpdate, User};
