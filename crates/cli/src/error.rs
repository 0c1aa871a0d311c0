//! CLI error type.

use addressbook_client::{ClientError, ConfigError, InputError};
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A client operation failed.
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Command-line input was rejected before anything was sent.
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// The command needs a session and none is stored.
    #[error("Not logged in; run `abook login` first")]
    NotLoggedIn,
}
