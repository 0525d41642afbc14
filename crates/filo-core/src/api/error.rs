use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - request rejected after token refresh")]
    Unauthorized,

    #[error("Session expired: {0}")]
    SessionExpired(#[source] Box<ApiError>),

    #[error("No refresh token stored")]
    MissingRefreshToken,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected ({status}): {detail}")]
    Validation { status: StatusCode, detail: String },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    /// Pull a human-readable message out of an error body.
    ///
    /// The backend answers with either `{"detail": "..."}` or a map of field
    /// names to message lists; anything else falls back to the raw body.
    pub fn extract_detail(body: &str) -> String {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return Self::truncate_body(body.trim());
        };

        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }

        if let Some(fields) = value.as_object() {
            let lines: Vec<String> = fields
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, join_messages(messages)))
                .collect();
            if !lines.is_empty() {
                return lines.join("\n");
            }
        }

        Self::truncate_body(body.trim())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(Self::extract_detail(body)),
            404 => ApiError::NotFound(Self::extract_detail(body)),
            400..=499 => ApiError::Validation {
                status,
                detail: Self::extract_detail(body),
            },
            500..=599 => ApiError::ServerError(Self::truncate_body(body)),
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    /// True when the caller has to log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired(_))
    }

    /// Text for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::SessionExpired(_) | ApiError::MissingRefreshToken => {
                "Your session has expired. Please log in again.".to_string()
            }
            ApiError::Unauthorized => "You are not authorized to do that.".to_string(),
            ApiError::AccessDenied(detail)
            | ApiError::NotFound(detail)
            | ApiError::Validation { detail, .. } => detail.clone(),
            ApiError::NetworkError(e) if e.is_timeout() => {
                "The server did not respond in time. Please try again.".to_string()
            }
            ApiError::NetworkError(_) => {
                "Unable to reach the server. Check your connection.".to_string()
            }
            ApiError::ServerError(_) | ApiError::InvalidResponse(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }
}

fn join_messages(messages: &serde_json::Value) -> String {
    match messages {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
            .collect::<Vec<_>>()
            .join(" "),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
