//! Bearer-token session shared by the gateway, the route guard and the UI.
//!
//! The token lives in memory behind a lock and is written through to a
//! [`TokenStorage`] so a restart picks it up again. There is no expiry timer:
//! the session only ends on logout or when the server answers 401.

pub mod auth;

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::SyncResult;
use crate::storage::{ClientDatabase, TOKEN_KEY};

/// Durable home for the bearer token.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> SyncResult<Option<String>>;
    fn save(&self, token: &str) -> SyncResult<()>;
    fn remove(&self) -> SyncResult<()>;
}

impl TokenStorage for ClientDatabase {
    fn load(&self) -> SyncResult<Option<String>> {
        Ok(self.get_value(TOKEN_KEY)?)
    }

    fn save(&self, token: &str) -> SyncResult<()> {
        Ok(self.set_value(TOKEN_KEY, token)?)
    }

    fn remove(&self) -> SyncResult<()> {
        Ok(self.remove_value(TOKEN_KEY)?)
    }
}

/// Storage that forgets everything on exit.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: RwLock<Option<String>>,
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> SyncResult<Option<String>> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> SyncResult<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> SyncResult<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionStore {
    token: Arc<RwLock<Option<String>>>,
    storage: Arc<dyn TokenStorage>,
}

impl SessionStore {
    /// Reads the persisted token once. A storage failure starts the app logged out.
    pub fn restore(storage: Arc<dyn TokenStorage>) -> Self {
        let token = match storage.load() {
            Ok(token) => token,
            Err(err) => {
                log::warn!("Failed to read persisted session token: {err}");
                None
            }
        };
        if token.is_some() {
            log::info!("Restored persisted session");
        }
        Self {
            token: Arc::new(RwLock::new(token)),
            storage,
        }
    }

    pub fn in_memory() -> Self {
        Self::restore(Arc::new(MemoryTokenStorage::default()))
    }

    pub fn set_token(&self, token: impl Into<String>) -> SyncResult<()> {
        let token = token.into();
        self.storage.save(&token)?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops the token in memory even if the persisted copy cannot be removed,
    /// so the current process is logged out either way.
    pub fn clear(&self) -> SyncResult<()> {
        let had_token = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if had_token {
            log::info!("Session cleared");
        }
        self.storage.remove()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
