//! Session Store
//!
//! Process-wide client state: login status, token, user id/role and a cached
//! profile. Pages read snapshots and request changes through the store's
//! actions; every change is serialized once, as a single namespaced blob, and
//! rehydrated at startup.

mod storage;

pub use storage::{FileStorage, MemoryStorage, SessionStorage};

use crate::client::TokenSource;
use crate::models::{UserPatch, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Namespace of the persisted blob
pub const STORAGE_KEY: &str = "auth-storage";

/// Authentication status and cached profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub is_logged_in: bool,
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub user_role: Option<String>,
    pub user: Option<UserProfile>,
}

/// On-disk envelope around the session
#[derive(Debug, Serialize)]
struct Persisted<'a> {
    name: &'a str,
    state: &'a Session,
}

#[derive(Debug, Deserialize)]
struct Stored {
    name: String,
    state: Session,
}

/// Errors from the session layer
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

/// The session store
pub struct SessionStore {
    state: RwLock<Session>,
    storage: Box<dyn SessionStorage>,
}

impl SessionStore {
    /// Open the store, rehydrating from `storage`.
    ///
    /// A blob that cannot be read or no longer matches the session shape
    /// yields the empty session.
    pub fn open(storage: impl SessionStorage + 'static) -> Self {
        let state = match storage.load() {
            Ok(Some(blob)) => match serde_json::from_str::<Stored>(&blob) {
                Ok(persisted) if persisted.name == STORAGE_KEY => persisted.state,
                Ok(persisted) => {
                    tracing::warn!(name = %persisted.name, "ignoring session stored under another key");
                    Session::default()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stored session unreadable, starting empty");
                    Session::default()
                }
            },
            Ok(None) => Session::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load stored session, starting empty");
                Session::default()
            }
        };

        Self {
            state: RwLock::new(state),
            storage: Box::new(storage),
        }
    }

    /// A store that forgets everything when dropped
    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current session
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.read().is_logged_in
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.read().user_id.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    /// Mark the session as logged in. The token is not inspected.
    pub fn login(
        &self,
        token: impl Into<String>,
        user_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Result<(), SessionError> {
        let (token, user_id, role) = (token.into(), user_id.into(), role.into());
        self.mutate(|session| {
            session.is_logged_in = true;
            session.token = Some(token);
            session.user_id = Some(user_id);
            session.user_role = Some(role);
        })
    }

    /// Reset every field to its empty state
    pub fn logout(&self) -> Result<(), SessionError> {
        self.mutate(|session| *session = Session::default())
    }

    /// Replace the cached profile
    pub fn set_user(&self, user: UserProfile) -> Result<(), SessionError> {
        self.mutate(|session| session.user = Some(user))
    }

    /// Shallow-merge into the cached profile; no-op when none is cached
    pub fn update_user(&self, patch: &UserPatch) -> Result<(), SessionError> {
        self.mutate(|session| {
            if let Some(user) = session.user.as_mut() {
                user.apply(patch);
            }
        })
    }

    /// Apply a change and persist it. The write lock is held until the blob
    /// is saved so storage order matches the order changes were applied.
    fn mutate(&self, change: impl FnOnce(&mut Session)) -> Result<(), SessionError> {
        let mut guard = self.write();
        change(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, state: &Session) -> Result<(), SessionError> {
        let blob = serde_json::to_string(&Persisted {
            name: STORAGE_KEY,
            state,
        })?;
        self.storage.save(&blob)
    }
}

impl TokenSource for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}
