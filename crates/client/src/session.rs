//! Session store and session controller.
//!
//! The session is a single optional bearer token, persisted across runs in a
//! small key-value [`SessionStore`]. Store operations are best-effort: a
//! failed write is logged and the in-memory session still changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use addressbook_core::SessionToken;
use tracing::{debug, info, warn};

/// Store key holding the session token.
pub const TOKEN_KEY: &str = "token";

/// Persisted key-value slot for session data.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&self, key: &str, value: &str);

    /// Remove a value.
    fn remove(&self, key: &str);
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory Store
// ─────────────────────────────────────────────────────────────────────────────

/// Session store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a token, as after a previous login.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set(TOKEN_KEY, token);
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Store
// ─────────────────────────────────────────────────────────────────────────────

/// Session store backed by a JSON object on disk.
///
/// A missing or unreadable file reads as an empty store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Use the file at `path`; it is created on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return HashMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
            HashMap::new()
        })
    }

    fn write_all(&self, values: &HashMap<String, String>) {
        if let Err(e) = self.try_write_all(values) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist session file");
        }
    }

    fn try_write_all(&self, values: &HashMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, contents)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.read_all();
        values.insert(key.to_owned(), value.to_owned());
        self.write_all(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.read_all();
        if values.remove(key).is_some() {
            self.write_all(&values);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Controller
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the process-wide session token.
///
/// The token is read from the store once by [`SessionController::resolve`]
/// and afterwards only changes through [`SessionController::login`] and
/// [`SessionController::logout`].
#[derive(Debug)]
pub struct SessionController<S> {
    store: S,
    token: RwLock<Option<SessionToken>>,
}

impl<S: SessionStore> SessionController<S> {
    /// Create an unauthenticated controller over `store`.
    pub const fn new(store: S) -> Self {
        Self {
            store,
            token: RwLock::new(None),
        }
    }

    /// Read the stored token at startup. No network call is made.
    ///
    /// A blank stored value counts as no session.
    pub fn resolve(&self) -> Option<SessionToken> {
        let token = self
            .store
            .get(TOKEN_KEY)
            .and_then(|raw| SessionToken::new(raw).ok());

        debug!(found = token.is_some(), "Session resolved from store");
        self.token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clone_from(&token);
        token
    }

    /// Persist a freshly issued token and make it current.
    pub fn login(&self, token: SessionToken) {
        self.store.set(TOKEN_KEY, token.expose());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        info!("Session started");
    }

    /// Forget the current token, in memory and in the store.
    pub fn logout(&self) {
        self.store.remove(TOKEN_KEY);
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Session ended");
    }

    /// The current token, if authenticated.
    pub fn token(&self) -> Option<SessionToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}
