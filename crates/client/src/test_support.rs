//! In-memory account service for unit tests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use addressbook_core::{
    Address, AddressFields, AddressId, ProfileUpdate, SessionToken, User, UserId,
};
use tokio::sync::oneshot;

use crate::api::AccountApi;
use crate::auth::{Credentials, Registration};
use crate::error::ClientError;

pub fn token(value: &str) -> SessionToken {
    SessionToken::new(value).unwrap()
}

pub fn fields(city: &str) -> AddressFields {
    AddressFields {
        country: "Brazil".to_string(),
        city: city.to_string(),
        street: "Rua das Flores".to_string(),
        number: "100".to_string(),
        complement: String::new(),
        state: "RS".to_string(),
        zipcode: "90000-000".to_string(),
    }
}

pub fn address(id: u64, city: &str) -> Address {
    Address::new(AddressId::new(id), fields(city))
}

pub fn user(addresses: Vec<Address>) -> User {
    User {
        id: UserId::new(1),
        name: "John".to_string(),
        email: "john@x.com".to_string(),
        addresses,
        deleted_at: None,
    }
}

enum Failure {
    Status(u16),
    Network,
}

struct Script {
    user: User,
    issued_token: String,
    calls: Vec<&'static str>,
    failures: VecDeque<Failure>,
    gates: VecDeque<oneshot::Receiver<()>>,
    next_id: Option<u64>,
    normalize_profiles: bool,
}

/// Scripted [`AccountApi`] that keeps its own copy of the user, records
/// every call, and can fail or hold individual calls.
#[derive(Clone)]
pub struct ScriptedApi {
    script: Arc<Mutex<Script>>,
}

impl ScriptedApi {
    pub fn with_user(user: User) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                user,
                issued_token: "t1".to_string(),
                calls: Vec::new(),
                failures: VecDeque::new(),
                gates: VecDeque::new(),
                next_id: None,
                normalize_profiles: false,
            })),
        }
    }

    pub fn issue_token(&self, value: &str) {
        self.script.lock().unwrap().issued_token = value.to_string();
    }

    pub fn fail_next_with_status(&self, status: u16) {
        self.script
            .lock()
            .unwrap()
            .failures
            .push_back(Failure::Status(status));
    }

    pub fn fail_next_network(&self) {
        self.script.lock().unwrap().failures.push_back(Failure::Network);
    }

    /// The next call waits until the paired sender fires.
    pub fn hold_next(&self, gate: oneshot::Receiver<()>) {
        self.script.lock().unwrap().gates.push_back(gate);
    }

    pub fn assign_next_id(&self, id: u64) {
        self.script.lock().unwrap().next_id = Some(id);
    }

    /// Trim names and lowercase emails on profile updates.
    pub fn normalize_profiles(&self) {
        self.script.lock().unwrap().normalize_profiles = true;
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn server_user(&self) -> User {
        self.script.lock().unwrap().user.clone()
    }

    async fn begin(&self, call: &'static str) -> Result<(), ClientError> {
        let (gate, failure) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(call);
            (script.gates.pop_front(), script.failures.pop_front())
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match failure {
            None => Ok(()),
            Some(Failure::Network) => Err(ClientError::Network("connection refused".to_string())),
            Some(Failure::Status(status)) => Err(ClientError::Rejected {
                status,
                message: format!("scripted failure {status}"),
            }),
        }
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        f(&mut self.script.lock().unwrap())
    }
}

fn not_found() -> ClientError {
    ClientError::Rejected {
        status: 404,
        message: "address not found".to_string(),
    }
}

impl AccountApi for ScriptedApi {
    async fn login(&self, _credentials: &Credentials) -> Result<SessionToken, ClientError> {
        self.begin("login").await?;
        Ok(token(&self.with_script(|s| s.issued_token.clone())))
    }

    async fn register(&self, _registration: &Registration) -> Result<(), ClientError> {
        self.begin("register").await
    }

    async fn get_user(&self, _token: &SessionToken) -> Result<User, ClientError> {
        self.begin("get_user").await?;
        Ok(self.server_user())
    }

    async fn update_user(
        &self,
        _token: &SessionToken,
        profile: &ProfileUpdate,
    ) -> Result<ProfileUpdate, ClientError> {
        self.begin("update_user").await?;
        Ok(self.with_script(|s| {
            let stored = if s.normalize_profiles {
                ProfileUpdate {
                    name: profile.name.trim().to_string(),
                    email: profile.email.to_lowercase(),
                }
            } else {
                profile.clone()
            };
            s.user.name.clone_from(&stored.name);
            s.user.email.clone_from(&stored.email);
            stored
        }))
    }

    async fn delete_user(&self, _token: &SessionToken) -> Result<(), ClientError> {
        self.begin("delete_user").await?;
        self.with_script(|s| s.user.addresses.clear());
        Ok(())
    }

    async fn create_address(
        &self,
        _token: &SessionToken,
        fields: &AddressFields,
    ) -> Result<Address, ClientError> {
        self.begin("create_address").await?;
        Ok(self.with_script(|s| {
            let next = s.user.addresses.iter().map(|a| a.id.as_u64()).max().unwrap_or(0) + 1;
            let id = AddressId::new(s.next_id.take().unwrap_or(next));
            let created = Address::new(id, fields.clone());
            s.user.addresses.push(created.clone());
            created
        }))
    }

    async fn update_address(
        &self,
        _token: &SessionToken,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, ClientError> {
        self.begin("update_address").await?;
        self.with_script(|s| {
            let entry = s
                .user
                .addresses
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(not_found)?;
            entry.fields = fields.clone();
            Ok(entry.clone())
        })
    }

    async fn delete_address(&self, _token: &SessionToken, id: AddressId) -> Result<(), ClientError> {
        self.begin("delete_address").await?;
        self.with_script(|s| {
            let before = s.user.addresses.len();
            s.user.addresses.retain(|a| a.id != id);
            if s.user.addresses.len() == before {
                Err(not_found())
            } else {
                Ok(())
            }
        })
    }
}
