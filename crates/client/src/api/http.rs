//! HTTP implementation of the account service adapter.

use std::sync::Arc;

use addressbook_core::{Address, AddressFields, AddressId, ProfileUpdate, SessionToken, User};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::AccountApi;
use super::wire::{AddressReply, ErrorBody, LoginRequest, RegisterRequest, TokenResponse};
use crate::auth::{Credentials, Registration};
use crate::config::ClientConfig;
use crate::error::ClientError;

/// `User-Agent` sent with every request.
const CLIENT_USER_AGENT: &str = concat!("addressbook/", env!("CARGO_PKG_VERSION"));

/// Client for the remote account service.
///
/// Cheap to clone; clones share one connection pool. No request timeout is
/// set, so the transport defaults apply.
#[derive(Clone)]
pub struct HttpAccountApi {
    inner: Arc<HttpAccountApiInner>,
}

struct HttpAccountApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpAccountApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAccountApi")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpAccountApi {
    /// Create a new client for the configured service.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config.api_url.clone())
    }

    /// Create a client from an existing `reqwest` client and a base URL
    /// ending in `/`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            inner: Arc::new(HttpAccountApiInner { client, base_url }),
        }
    }

    /// The service base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request Plumbing
    // ─────────────────────────────────────────────────────────────────────────

    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SessionToken>,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self.inner.base_url.join(path)?;
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT);

        Ok(match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        })
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = ensure_success(request.send().await?).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Account service returned an undecodable body");
            ClientError::InvalidResponse(e.to_string())
        })
    }

    /// Send a request whose success body is irrelevant.
    async fn send_empty(request: RequestBuilder) -> Result<(), ClientError> {
        ensure_success(request.send().await?).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into [`ClientError::Rejected`].
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!(status = %status, error = %e, "Failed to read error body");
            String::new()
        }
    };
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    warn!(status = %status, message = %message, "Account service rejected request");

    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}

impl AccountApi for HttpAccountApi {
    #[instrument(skip_all, fields(email = %credentials.email()))]
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, ClientError> {
        let body = LoginRequest {
            email: credentials.email().as_str(),
            password: credentials.password(),
        };

        let response: TokenResponse =
            Self::send_json(self.request(Method::POST, "login", None)?.json(&body)).await?;

        debug!("Login accepted");
        SessionToken::new(response.token)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    #[instrument(skip_all, fields(email = %registration.email()))]
    async fn register(&self, registration: &Registration) -> Result<(), ClientError> {
        let body = RegisterRequest {
            name: registration.name(),
            email: registration.email().as_str(),
            password: registration.password(),
        };

        Self::send_empty(self.request(Method::POST, "register", None)?.json(&body)).await?;

        debug!("Registration accepted");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn get_user(&self, token: &SessionToken) -> Result<User, ClientError> {
        let user: User = Self::send_json(self.request(Method::GET, "user", Some(token))?).await?;

        debug!(user_id = %user.id, addresses = user.addresses.len(), "User fetched");
        Ok(user)
    }

    #[instrument(skip_all)]
    async fn update_user(
        &self,
        token: &SessionToken,
        profile: &ProfileUpdate,
    ) -> Result<ProfileUpdate, ClientError> {
        Self::send_json(self.request(Method::PUT, "user", Some(token))?.json(profile)).await
    }

    #[instrument(skip_all)]
    async fn delete_user(&self, token: &SessionToken) -> Result<(), ClientError> {
        Self::send_empty(self.request(Method::DELETE, "user", Some(token))?).await?;

        debug!("Account deleted");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn create_address(
        &self,
        token: &SessionToken,
        fields: &AddressFields,
    ) -> Result<Address, ClientError> {
        let address: Address =
            Self::send_json(self.request(Method::POST, "user/address", Some(token))?.json(fields))
                .await?;

        debug!(address_id = %address.id, "Address created");
        Ok(address)
    }

    #[instrument(skip_all, fields(address_id = %id))]
    async fn update_address(
        &self,
        token: &SessionToken,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, ClientError> {
        let path = format!("user/address/{id}");
        let reply: AddressReply =
            Self::send_json(self.request(Method::PUT, &path, Some(token))?.json(fields)).await?;

        Ok(Address::new(reply.id_or(id), reply.fields))
    }

    #[instrument(skip_all, fields(address_id = %id))]
    async fn delete_address(&self, token: &SessionToken, id: AddressId) -> Result<(), ClientError> {
        let path = format!("user/address/{id}");
        Self::send_empty(self.request(Method::DELETE, &path, Some(token))?).await
    }
}
