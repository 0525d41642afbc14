use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, warn};

use super::session::Session;
use super::store::{MemoryTokenStore, TokenStore};

const SERVICE_NAME: &str = "filo";

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Tokens kept in the OS keychain, one entry per key.
#[derive(Debug, Default)]
pub struct KeyringTokenStore {
    memory: MemoryTokenStore,
}

impl KeyringTokenStore {
    /// Open the keychain-backed store and load any saved pair.
    pub fn open() -> Self {
        let access = read_entry(ACCESS_TOKEN_KEY);
        let refresh = read_entry(REFRESH_TOKEN_KEY);
        let memory = match Session::from_parts(access, refresh) {
            Some(session) => MemoryTokenStore::with_session(session),
            None => MemoryTokenStore::new(),
        };
        debug!(has_session = memory.has_session(), "Keyring session store opened");
        Self { memory }
    }
}

fn entry(key: &str) -> Result<Entry> {
    Entry::new(SERVICE_NAME, key).context("Failed to create keyring entry")
}

fn read_entry(key: &str) -> Option<String> {
    entry(key).ok()?.get_password().ok()
}

fn write_entry(key: &str, value: &str) {
    let result = entry(key).and_then(|e| {
        e.set_password(value)
            .context("Failed to store token in keychain")
    });
    if let Err(e) = result {
        warn!(error = %e, key, "Keyring write failed");
    }
}

fn delete_entry(key: &str) {
    let result = entry(key).and_then(|e| match e.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e).context("Failed to delete token from keychain"),
    });
    if let Err(e) = result {
        warn!(error = %e, key, "Keyring delete failed");
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Option<Session> {
        self.memory.get()
    }

    fn set(&self, session: Session) {
        write_entry(ACCESS_TOKEN_KEY, &session.access_token);
        write_entry(REFRESH_TOKEN_KEY, &session.refresh_token);
        self.memory.set(session);
    }

    fn set_access_token(&self, token: String) {
        if !self.memory.has_session() {
            return;
        }
        write_entry(ACCESS_TOKEN_KEY, &token);
        self.memory.set_access_token(token);
    }

    fn clear(&self) {
        self.memory.clear();
        delete_entry(ACCESS_TOKEN_KEY);
        delete_entry(REFRESH_TOKEN_KEY);
    }
}
