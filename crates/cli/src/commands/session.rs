//! Login, registration and logout.

use addressbook_client::{Credentials, Registration};

use super::{View, format_user, print_line};
use crate::error::CliError;

/// Log in and store the session.
pub async fn login(view: &View, email: &str, password: String) -> Result<(), CliError> {
    let credentials = Credentials::new(email, password)?;
    let user = view.login(&credentials).await?;

    print_line(&format!("Logged in.\n{}", format_user(&user)));
    Ok(())
}

/// Create an account. Does not log in.
pub async fn register(
    view: &View,
    name: &str,
    email: &str,
    password: String,
) -> Result<(), CliError> {
    let registration = Registration::new(name, email, password)?;
    view.register(&registration).await?;

    print_line(&format!(
        "Account created for {}. Run `abook login` to sign in.",
        registration.email()
    ));
    Ok(())
}

/// Forget the stored session. No request is made.
pub async fn logout(view: &View) {
    view.logout().await;
    print_line("Logged out.");
}
