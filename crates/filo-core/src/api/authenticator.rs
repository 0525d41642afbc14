use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::warn;

use crate::auth::SharedTokenStore;

/// Attaches the stored access token to outgoing requests.
#[derive(Clone)]
pub struct RequestAuthenticator {
    store: SharedTokenStore,
}

impl RequestAuthenticator {
    pub fn new(store: SharedTokenStore) -> Self {
        Self { store }
    }

    /// Set `Authorization: Bearer <token>` from the store, replacing any
    /// header already present. Without a token the headers are left as they
    /// are and the server is expected to reject the call.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let Some(session) = self.store.get() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", session.access_token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => {
                warn!(error = %e, "Stored access token is not a valid header value");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{MemoryTokenStore, Session, TokenStore};

    #[test]
    fn test_apply_sets_bearer_header() {
        let store = Arc::new(MemoryTokenStore::with_session(Session::new("T1", "R1")));
        let auth = RequestAuthenticator::new(store);

        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer T1");
    }

    #[test]
    fn test_apply_replaces_stale_header() {
        let store = Arc::new(MemoryTokenStore::with_session(Session::new("T1", "R1")));
        let auth = RequestAuthenticator::new(store.clone());

        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        store.set_access_token("T2".to_string());
        auth.apply(&mut headers);

        let values: Vec<_> = headers.get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], "Bearer T2");
    }

    #[test]
    fn test_apply_without_session_leaves_headers_alone() {
        let auth = RequestAuthenticator::new(Arc::new(MemoryTokenStore::new()));

        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_apply_skips_invalid_token() {
        let store = Arc::new(MemoryTokenStore::with_session(Session::new("bad\ntoken", "R1")));
        let auth = RequestAuthenticator::new(store);

        let mut headers = HeaderMap::new();
        auth.apply(&mut headers);
        assert!(headers.get(AUTHORIZATION).is_none());
    }
}
