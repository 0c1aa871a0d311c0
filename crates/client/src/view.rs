//! The authenticated account view.
//!
//! [`AccountView`] wires the session, the address cache and the address
//! form together the way one UI screen uses them. It is the entry point for
//! a shell: every user action maps to one method here, and every method
//! returns a `Result` for the shell to present.

use std::sync::{Mutex, MutexGuard, PoisonError};

use addressbook_core::{
    Address, AddressField, AddressFields, AddressId, Email, ProfileUpdate, SessionToken, User,
};
use tracing::{info, instrument};

use crate::api::AccountApi;
use crate::auth::{Credentials, Registration};
use crate::cache::{AddressCache, CacheState};
use crate::error::{ClientError, InputError, Precondition};
use crate::form::{FormController, FormDraft, SubmissionTarget};
use crate::session::{SessionController, SessionStore};

/// What a shell renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Whether a session token is present.
    pub authenticated: bool,
    /// The cache state.
    pub cache: CacheState,
    /// The address form.
    pub form: FormDraft,
}

impl AccountSnapshot {
    /// The loaded user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.cache.user()
    }
}

/// Session, cache and form of one client.
#[derive(Debug)]
pub struct AccountView<A, S> {
    session: SessionController<S>,
    cache: AddressCache<A>,
    form: Mutex<FormController>,
}

impl<A: AccountApi, S: SessionStore> AccountView<A, S> {
    /// Create a view talking to `api`, with its session kept in `store`.
    pub fn new(api: A, store: S) -> Self {
        Self {
            session: SessionController::new(store),
            cache: AddressCache::new(api),
            form: Mutex::new(FormController::new()),
        }
    }

    /// The session controller.
    pub const fn session(&self) -> &SessionController<S> {
        &self.session
    }

    /// The address cache.
    pub const fn cache(&self) -> &AddressCache<A> {
        &self.cache
    }

    fn form(&self) -> MutexGuard<'_, FormController> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn token(&self) -> Option<SessionToken> {
        self.session.token()
    }

    /// Current state for rendering.
    pub async fn snapshot(&self) -> AccountSnapshot {
        let cache = self.cache.snapshot().await;
        AccountSnapshot {
            authenticated: self.session.is_authenticated(),
            cache,
            form: self.form().draft().clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve the stored session and, if there is one, load the user.
    ///
    /// Returns `Ok(None)` when no session is stored.
    ///
    /// # Errors
    ///
    /// The load failure, if the stored token was present.
    pub async fn start(&self) -> Result<Option<User>, ClientError> {
        let Some(token) = self.session.resolve() else {
            info!("No stored session");
            return Ok(None);
        };
        self.load(&token).await.map(Some)
    }

    /// Log in, persist the new token and load the user.
    ///
    /// # Errors
    ///
    /// The login failure (nothing changes), or the load failure (the session
    /// is kept and the cache is `Failed`).
    #[instrument(skip_all, fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ClientError> {
        let token = self.cache.api().login(credentials).await?;
        self.session.login(token.clone());
        self.form().cancel();
        self.load(&token).await
    }

    /// Create an account. The caller logs in separately.
    ///
    /// # Errors
    ///
    /// The service failure.
    pub async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        self.cache.api().register(registration).await?;
        info!(email = %registration.email(), "Account registered");
        Ok(())
    }

    /// End the session: forget the token and drop the cache and the form.
    pub async fn logout(&self) {
        self.session.logout();
        self.cache.discard().await;
        self.form().cancel();
    }

    /// Fetch the user again for the current session.
    ///
    /// # Errors
    ///
    /// [`Precondition::Unauthenticated`] without a session, or the load
    /// failure.
    pub async fn reload(&self) -> Result<User, ClientError> {
        let token = self.token().ok_or(Precondition::Unauthenticated)?;
        self.load(&token).await
    }

    async fn load(&self, token: &SessionToken) -> Result<User, ClientError> {
        let result = self.cache.load(Some(token)).await;
        self.reconcile_form().await;
        result
    }

    async fn reconcile_form(&self) {
        let state = self.cache.snapshot().await;
        self.form().reconcile(state.user());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────

    /// Change name and email.
    ///
    /// # Errors
    ///
    /// [`InputError`] for an empty name or malformed email (nothing is
    /// sent), otherwise as [`AddressCache::update_user`].
    pub async fn update_user(&self, name: &str, email: &str) -> Result<User, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InputError::EmptyName.into());
        }
        let email = Email::parse(email).map_err(InputError::from)?;
        let profile = ProfileUpdate {
            name: name.to_owned(),
            email: email.into_inner(),
        };

        self.cache.update_user(self.token().as_ref(), &profile).await
    }

    /// Delete the account and, once the service confirms, end the session.
    ///
    /// # Errors
    ///
    /// As [`AddressCache::delete_user`]; on failure the session is kept.
    /// A confirmation that arrives after the session changed returns
    /// [`ClientError::SessionChanged`] and leaves the newer session alone.
    pub async fn delete_user(&self) -> Result<(), ClientError> {
        self.cache.delete_user(self.token().as_ref()).await?;
        info!("Account deleted; ending session");
        self.logout().await;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Addresses
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an address.
    ///
    /// # Errors
    ///
    /// As [`AddressCache::add_address`].
    pub async fn add_address(&self, fields: &AddressFields) -> Result<Address, ClientError> {
        self.cache.add_address(self.token().as_ref(), fields).await
    }

    /// Replace the fields of a cached address.
    ///
    /// # Errors
    ///
    /// As [`AddressCache::update_address`].
    pub async fn update_address(
        &self,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, ClientError> {
        self.cache
            .update_address(self.token().as_ref(), id, fields)
            .await
    }

    /// Delete a cached address; an edit form bound to it is closed.
    ///
    /// # Errors
    ///
    /// As [`AddressCache::delete_address`]; the form is untouched on error.
    pub async fn delete_address(&self, id: AddressId) -> Result<(), ClientError> {
        self.cache.delete_address(self.token().as_ref(), id).await?;
        self.form().address_removed(id);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Address Form
    // ─────────────────────────────────────────────────────────────────────────

    /// Open an empty add form.
    pub fn start_add(&self) {
        self.form().start_add();
    }

    /// Open the edit form for a cached address.
    ///
    /// # Errors
    ///
    /// [`Precondition::NotLoaded`] without a cached user, or
    /// [`Precondition::UnknownAddress`].
    pub async fn start_edit(&self, id: AddressId) -> Result<(), ClientError> {
        let state = self.cache.snapshot().await;
        let user = state.user().ok_or(Precondition::NotLoaded)?;
        self.form().start_edit(user, id)?;
        Ok(())
    }

    /// Open an add form when closed, close anything else.
    pub fn toggle_form(&self) {
        self.form().toggle();
    }

    /// Close the form and drop its draft.
    pub fn cancel_form(&self) {
        self.form().cancel();
    }

    /// Set one draft field by name (`street`, `city`, ...).
    ///
    /// # Errors
    ///
    /// [`InputError::Field`] for an unknown name, or
    /// [`Precondition::FormClosed`].
    pub fn set_field(&self, name: &str, value: &str) -> Result<(), ClientError> {
        let field: AddressField = name.parse().map_err(InputError::from)?;
        self.form().set_field(field, value)?;
        Ok(())
    }

    /// Submit the open form: add in add mode, update the bound address in
    /// edit mode. On success the form closes; on failure the draft is kept
    /// for a retry.
    ///
    /// # Errors
    ///
    /// [`Precondition::FormClosed`], or the error of the cache operation.
    pub async fn submit_form(&self) -> Result<Address, ClientError> {
        let submission = self.form().submission()?;

        let saved = match submission.target() {
            SubmissionTarget::Add => self.add_address(submission.fields()).await?,
            SubmissionTarget::Update(id) => self.update_address(id, submission.fields()).await?,
        };

        self.form().confirm(&submission);
        Ok(saved)
    }
}
