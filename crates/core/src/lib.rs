//! Address Book Core - Shared domain types.
//!
//! This crate provides the types shared by every address book component:
//! - `client` - Session, cache and form state machines plus the HTTP adapter
//! - `cli` - Command-line shell driving the client
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere,
//! including by test doubles of the remote service.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, session token, user and address records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
