//! Command implementations.
//!
//! Every command runs against one [`View`]: the session is resolved from the
//! session file and the user is loaded before anything else happens.

pub mod account;
pub mod address;
pub mod session;

use addressbook_client::{AccountView, FileSessionStore, HttpAccountApi};
use addressbook_core::{Address, User};

use crate::error::CliError;

/// The account view used by the CLI.
pub type View = AccountView<HttpAccountApi, FileSessionStore>;

/// Resolve the stored session and load the user, or fail with
/// [`CliError::NotLoggedIn`].
async fn require_user(view: &View) -> Result<User, CliError> {
    view.start().await?.ok_or(CliError::NotLoggedIn)
}

fn format_address(address: &Address) -> String {
    let line = address.fields.formatted_single_line();
    if line.is_empty() {
        format!("[{}] (empty)", address.id)
    } else {
        format!("[{}] {line}", address.id)
    }
}

fn format_user(user: &User) -> String {
    let mut out = format!("{} <{}>\n", user.name, user.email);
    if user.addresses.is_empty() {
        out.push_str("No addresses.");
    } else {
        out.push_str(&format!("Addresses ({}):", user.addresses.len()));
        for address in &user.addresses {
            out.push_str("\n  ");
            out.push_str(&format_address(address));
        }
    }
    out
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}
