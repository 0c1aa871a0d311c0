//! Profile commands.

use super::{View, format_user, print_line, require_user};
use crate::error::CliError;

/// Print the profile and all addresses.
pub async fn show(view: &View) -> Result<(), CliError> {
    let user = require_user(view).await?;
    print_line(&format_user(&user));
    Ok(())
}

/// Change name and email.
pub async fn update_profile(view: &View, name: &str, email: &str) -> Result<(), CliError> {
    require_user(view).await?;
    let user = view.update_user(name, email).await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    print_line(&format!("Profile updated: {} <{}>", user.name, user.email));
    Ok(())
}

/// Delete the account. The session ends once the service confirms.
pub async fn delete_account(view: &View) -> Result<(), CliError> {
    let user = require_user(view).await?;
    view.delete_user().await?;

    print_line(&format!("Account {} deleted. You are logged out.", user.email));
    Ok(())
}
