//! Mock account service for end-to-end tests.
//!
//! An in-memory stand-in for the remote account service, served by `axum`
//! on an ephemeral local port. It speaks the same wire format as the real
//! service, including its quirks:
//!
//! - `GET /user` returns `"addresses": null` for a user without addresses
//! - `PUT /user` and `PUT /user/address/{id}` echo the request body with
//!   zeroed ids instead of the stored record
//! - every error body is `{"error": "..."}`
//!
//! # Usage
//!
//! ```rust,ignore
//! let service = MockService::start().await?;
//! let config = ClientConfig::for_api_url(&service.base_url(), session_path)?;
//! let api = HttpAccountApi::new(&config);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Timestamp the service uses for zero-valued records.
const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

/// Timestamp stamped on every stored record.
const STORED_TIME: &str = "2024-05-01T12:00:00Z";

#[derive(Debug, Clone)]
struct StoredAddress {
    id: u64,
    fields: AddressBody,
}

#[derive(Debug, Clone)]
struct Account {
    id: u64,
    name: String,
    email: String,
    password: String,
    addresses: Vec<StoredAddress>,
}

#[derive(Debug, Default)]
struct Store {
    accounts: Vec<Account>,
    tokens: HashMap<String, u64>,
    next_user_id: u64,
    next_address_id: u64,
    next_token: u64,
    requests: Vec<String>,
    injected: Option<(StatusCode, String)>,
}

impl Store {
    fn account_mut(&mut self, user_id: u64) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == user_id)
    }
}

/// Shared state of a running mock service.
#[derive(Debug, Clone, Default)]
pub struct MockState {
    store: Arc<Mutex<Store>>,
}

impl MockState {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A mock account service listening on `127.0.0.1`.
///
/// The server task is aborted on drop.
#[derive(Debug)]
pub struct MockService {
    addr: SocketAddr,
    state: MockState,
    task: JoinHandle<()>,
}

impl MockService {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = MockState::default();
        let app = router(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock account service stopped");
            }
        });

        Ok(Self { addr, state, task })
    }

    /// Base URL of the service.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Create an account directly, bypassing `POST /register`.
    pub fn seed_account(&self, name: &str, email: &str, password: &str) -> u64 {
        let mut store = self.state.lock();
        create_account(&mut store, name, email, password)
    }

    /// Add an address to an account directly and return its id.
    ///
    /// Returns `None` if there is no such account.
    pub fn seed_address(&self, user_id: u64, city: &str) -> Option<u64> {
        let mut store = self.state.lock();
        store.next_address_id += 1;
        let id = store.next_address_id;
        let account = store.account_mut(user_id)?;
        account.addresses.push(StoredAddress {
            id,
            fields: AddressBody {
                city: city.to_string(),
                ..AddressBody::default()
            },
        });
        Some(id)
    }

    /// Answer the next request with `status` and a raw `body`, without
    /// touching any state.
    pub fn fail_next(&self, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state.lock().injected = Some((status, body.to_string()));
    }

    /// Requests received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    /// Cities of the stored addresses of an account, in order.
    #[must_use]
    pub fn stored_cities(&self, user_id: u64) -> Vec<String> {
        self.state
            .lock()
            .accounts
            .iter()
            .find(|account| account.id == user_id)
            .map(|account| {
                account
                    .addresses
                    .iter()
                    .map(|address| address.fields.city.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether an account with this email exists.
    #[must_use]
    pub fn has_account(&self, email: &str) -> bool {
        self.state
            .lock()
            .accounts
            .iter()
            .any(|account| account.email == email)
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn create_account(store: &mut Store, name: &str, email: &str, password: &str) -> u64 {
    store.next_user_id += 1;
    let id = store.next_user_id;
    store.accounts.push(Account {
        id,
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        addresses: Vec::new(),
    });
    id
}

// ─────────────────────────────────────────────────────────────────────────────
// Routes
// ─────────────────────────────────────────────────────────────────────────────

fn router(state: MockState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/user", put(update_user).get(get_user).delete(delete_user))
        .route("/user/address", post(create_address))
        .route(
            "/user/address/{id}",
            put(update_address).delete(delete_address),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

/// Record every request and answer with an injected failure if one is
/// pending.
async fn record_request(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let injected = {
        let mut store = state.lock();
        store
            .requests
            .push(format!("{} {}", request.method(), request.uri().path()));
        store.injected.take()
    };

    match injected {
        Some((status, body)) => (status, body).into_response(),
        None => next.run(request).await,
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Resolve the bearer token of a request to a user id.
fn authenticate(state: &MockState, headers: &HeaderMap) -> Result<u64, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "missing token"))?;

    let store = state.lock();
    let user_id = store
        .tokens
        .get(token)
        .copied()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "invalid token"))?;

    if store.accounts.iter().any(|account| account.id == user_id) {
        Ok(user_id)
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "user not found"))
    }
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> Response {
    let mut store = state.lock();
    let Some(user_id) = store
        .accounts
        .iter()
        .find(|account| account.email == body.email && account.password == body.password)
        .map(|account| account.id)
    else {
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    };

    store.next_token += 1;
    let token = format!("token-{}-{}", user_id, store.next_token);
    store.tokens.insert(token.clone(), user_id);

    Json(json!({ "token": token })).into_response()
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

async fn register(State(state): State<MockState>, Json(body): Json<RegisterBody>) -> Response {
    if body.name.is_empty() || body.email.is_empty() || body.password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "name, email and password are required");
    }

    let mut store = state.lock();
    if store.accounts.iter().any(|account| account.email == body.email) {
        return error(StatusCode::BAD_REQUEST, "email already registered");
    }
    create_account(&mut store, &body.name, &body.email, &body.password);

    (StatusCode::CREATED, Json(json!({ "message": "user created" }))).into_response()
}

fn address_json(id: u64, user_id: u64, fields: &AddressBody, stamp: &str) -> Value {
    json!({
        "address_id": id,
        "user_id": user_id,
        "street": fields.street,
        "number": fields.number,
        "complement": fields.complement,
        "city": fields.city,
        "state": fields.state,
        "zipcode": fields.zipcode,
        "country": fields.country,
        "created_at": stamp,
        "updated_at": stamp,
    })
}

fn user_json(id: u64, name: &str, email: &str, addresses: Option<Vec<Value>>, stamp: &str) -> Value {
    json!({
        "ID": id,
        "CreatedAt": stamp,
        "UpdatedAt": stamp,
        "DeletedAt": null,
        "name": name,
        "email": email,
        "addresses": addresses,
    })
}

async fn get_user(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let mut store = state.lock();
    let Some(account) = store.account_mut(user_id) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };

    let addresses: Vec<Value> = account
        .addresses
        .iter()
        .map(|address| address_json(address.id, user_id, &address.fields, STORED_TIME))
        .collect();
    let addresses = (!addresses.is_empty()).then_some(addresses);

    Json(user_json(
        account.id,
        &account.name,
        &account.email,
        addresses,
        STORED_TIME,
    ))
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ProfileBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

async fn update_user(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<ProfileBody>,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let mut store = state.lock();
    let Some(account) = store.account_mut(user_id) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };
    account.name.clone_from(&body.name);
    account.email.clone_from(&body.email);

    Json(user_json(0, &body.name, &body.email, None, ZERO_TIME)).into_response()
}

async fn delete_user(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let mut store = state.lock();
    store.accounts.retain(|account| account.id != user_id);
    store.tokens.retain(|_, owner| *owner != user_id);

    Json(json!({ "message": "user deleted" })).into_response()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AddressBody {
    country: String,
    city: String,
    street: String,
    number: String,
    complement: String,
    state: String,
    zipcode: String,
}

async fn create_address(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<AddressBody>,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let mut store = state.lock();
    store.next_address_id += 1;
    let id = store.next_address_id;
    let Some(account) = store.account_mut(user_id) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };
    account.addresses.push(StoredAddress {
        id,
        fields: body.clone(),
    });

    (
        StatusCode::CREATED,
        Json(address_json(id, user_id, &body, STORED_TIME)),
    )
        .into_response()
}

async fn update_address(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<AddressBody>,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let mut store = state.lock();
    let Some(stored) = store
        .account_mut(user_id)
        .and_then(|account| account.addresses.iter_mut().find(|address| address.id == id))
    else {
        return error(StatusCode::NOT_FOUND, "address not found");
    };
    stored.fields = body.clone();

    Json(address_json(0, 0, &body, ZERO_TIME)).into_response()
}

async fn delete_address(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    let mut store = state.lock();
    let Some(account) = store.account_mut(user_id) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };
    let before = account.addresses.len();
    account.addresses.retain(|address| address.id != id);
    if account.addresses.len() == before {
        return error(StatusCode::NOT_FOUND, "address not found");
    }

    Json(json!({ "message": "address deleted" })).into_response()
}
