use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Persisted sessions older than this are treated as absent.
/// Matches the 7-day lifetime the web dashboard gave its token cookies.
pub const SESSION_MAX_AGE_DAYS: i64 = 7;

/// The token pair issued by the auth server.
///
/// Both tokens are opaque bearer credentials. A session only exists when
/// both are present; stores never hand out a lone access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Build a session from optional halves, rejecting partial or empty pairs.
    pub fn from_parts(access: Option<String>, refresh: Option<String>) -> Option<Self> {
        match (access, refresh) {
            (Some(a), Some(r)) if !a.is_empty() && !r.is_empty() => Some(Self::new(a, r)),
            _ => None,
        }
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// On-disk layout of `session.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(session: &Session) -> Self {
        Self {
            access_token: Some(session.access_token.clone()),
            refresh_token: Some(session.refresh_token.clone()),
            saved_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.saved_at + Duration::days(SESSION_MAX_AGE_DAYS)
    }

    /// The usable session, if the file holds a complete, unexpired pair.
    pub fn into_session(self) -> Option<Session> {
        if self.is_expired() {
            return None;
        }
        Session::from_parts(self.access_token, self.refresh_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_both_tokens() {
        assert!(Session::from_parts(Some("a".into()), Some("r".into())).is_some());
        assert!(Session::from_parts(Some("a".into()), None).is_none());
        assert!(Session::from_parts(None, Some("r".into())).is_none());
        assert!(Session::from_parts(Some(String::new()), Some("r".into())).is_none());
        assert!(Session::from_parts(None, None).is_none());
    }

    #[test]
    fn test_stored_session_expiry() {
        let session = Session::new("T1", "R1");
        let mut stored = StoredSession::new(&session);
        assert!(!stored.is_expired());
        assert_eq!(stored.clone().into_session(), Some(session));

        stored.saved_at = Utc::now() - Duration::days(SESSION_MAX_AGE_DAYS + 1);
        assert!(stored.is_expired());
        assert!(stored.into_session().is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", Session::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret"));
    }
}
