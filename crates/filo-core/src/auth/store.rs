//! Credential storage for the token pair.
//!
//! `TokenStore` is the narrow interface every other component goes through.
//! Reads are synchronous and never fail; persistent backends keep an
//! in-memory mirror and write through on every mutation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::credentials::KeyringTokenStore;
use super::session::{Session, StoredSession};

/// Session file name in the cache directory
const SESSION_FILE: &str = "session.json";

/// Shared handle used by the API client, the route guard and the UI.
pub type SharedTokenStore = Arc<dyn TokenStore>;

pub trait TokenStore: Send + Sync {
    /// Current session, or `None` when absent or partial.
    fn get(&self) -> Option<Session>;

    /// Store both tokens at once.
    fn set(&self, session: Session);

    /// Replace only the access token. Does nothing when no session exists.
    fn set_access_token(&self, token: String);

    /// Remove both tokens. Safe to call repeatedly.
    fn clear(&self);

    fn has_session(&self) -> bool {
        self.get().is_some()
    }
}

/// Which persistent backend holds the tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

/// Open the configured backend.
pub fn open_store(backend: CredentialBackend, cache_dir: &Path) -> Result<SharedTokenStore> {
    let store: SharedTokenStore = match backend {
        CredentialBackend::File => Arc::new(FileTokenStore::open(cache_dir)?),
        CredentialBackend::Keyring => Arc::new(KeyringTokenStore::open()),
    };
    Ok(store)
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    /// Apply `f` to the current value and return the value after the update.
    pub(crate) fn update<F>(&self, f: F) -> Option<Session>
    where
        F: FnOnce(&mut Option<Session>),
    {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
        guard.clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set(&self, session: Session) {
        self.update(|current| *current = Some(session));
    }

    fn set_access_token(&self, token: String) {
        self.update(|current| {
            if let Some(session) = current.as_mut() {
                session.access_token = token;
            }
        });
    }

    fn clear(&self) {
        self.update(|current| *current = None);
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// Tokens persisted to `session.json` in the cache directory.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    memory: MemoryTokenStore,
}

impl FileTokenStore {
    /// Open the store, loading any saved session. A missing, unreadable or
    /// expired file starts the store empty.
    pub fn open(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;

        let path = cache_dir.join(SESSION_FILE);
        let memory = match Self::load(&path) {
            Ok(Some(session)) => MemoryTokenStore::with_session(session),
            Ok(None) => MemoryTokenStore::new(),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                MemoryTokenStore::new()
            }
        };
        debug!(path = %path.display(), has_session = memory.has_session(), "Session store opened");

        Ok(Self { path, memory })
    }

    fn load(path: &Path) -> Result<Option<Session>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).context("Failed to read session file")?;
        let stored: StoredSession =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        if stored.is_expired() {
            debug!("Saved session expired");
        }
        Ok(stored.into_session())
    }

    fn persist(&self, session: Option<&Session>) {
        let result = match session {
            Some(session) => self.write(session),
            None => self.remove(),
        };
        if let Err(e) = result {
            warn!(error = %e, path = %self.path.display(), "Failed to persist session");
        }
    }

    fn write(&self, session: &Session) -> Result<()> {
        let contents = serde_json::to_string_pretty(&StoredSession::new(session))?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<Session> {
        self.memory.get()
    }

    // File writes happen under the memory write lock.
    fn set(&self, session: Session) {
        self.memory.update(|current| {
            *current = Some(session);
            self.persist(current.as_ref());
        });
    }

    fn set_access_token(&self, token: String) {
        self.memory.update(|current| {
            if let Some(session) = current.as_mut() {
                session.access_token = token;
                self.persist(current.as_ref());
            }
        });
    }

    fn clear(&self) {
        self.memory.update(|current| {
            *current = None;
            self.persist(None);
        });
    }
}
