use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired{}", detail(.0))]
    Unauthorized(Option<String>),

    #[error("Access denied{}", detail(.0))]
    AccessDenied(Option<String>),

    #[error("Resource not found{}", detail(.0))]
    NotFound(Option<String>),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Request rejected (status {status}){}", detail(.message))]
    Rejected { status: u16, message: Option<String> },

    #[error("Server error (status {status}){}", detail(.message))]
    ServerError { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    /// Pull the backend's explanation out of an error body.
    ///
    /// The backend answers errors with a JSON object carrying `message` or
    /// `error`, a bare JSON string, or plain text.
    fn extract_message(body: &str) -> Option<String> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::String(s)) => Some(s).filter(|s| !s.trim().is_empty()),
            Ok(serde_json::Value::Object(map)) => ["message", "error"].iter().find_map(|key| {
                map.get(*key)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            }),
            Ok(_) => None,
            Err(_) => Some(Self::truncate_body(trimmed)),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            code @ 500..=599 => ApiError::ServerError { status: code, message },
            code => ApiError::Rejected { status: code, message },
        }
    }

    /// The backend's own message, when it sent one
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(m) | ApiError::AccessDenied(m) | ApiError::NotFound(m) => {
                m.as_deref()
            }
            ApiError::Rejected { message, .. } | ApiError::ServerError { message, .. } => {
                message.as_deref()
            }
            ApiError::RateLimited | ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => {
                None
            }
        }
    }

    /// Text to show the user: the backend message verbatim, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_message_from_json_object() {
        let body = r#"{"timestamp":"2024-09-20T10:00:00Z","status":400,"error":"Bad Request","message":"Player 12 is not available"}"#;
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.message(), Some("Player 12 is not available"));
        assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
    }

    #[test]
    fn test_message_falls_back_to_error_field() {
        let err = ApiError::from_status(StatusCode::CONFLICT, r#"{"error":"Team name taken"}"#);
        assert_eq!(err.message(), Some("Team name taken"));
    }

    #[test]
    fn test_message_from_plain_text_and_json_string() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "Bad credentials");
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(err.message(), Some("Bad credentials"));

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#""Invalid join code""#);
        assert_eq!(err.message(), Some("Invalid join code"));
    }

    #[test]
    fn test_no_message() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());
        assert_eq!(err.message(), None);
        assert_eq!(err.user_message("Something went wrong"), "Something went wrong");

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, r#"{"status":502}"#);
        assert!(matches!(err, ApiError::ServerError { status: 502, message: None }));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, &body);
        let message = err.message().unwrap();
        assert!(message.len() < 600);
        assert!(message.contains("truncated, 2000 total bytes"));
    }

    #[test]
    fn test_display_includes_message() {
        let err = ApiError::AccessDenied(Some("Not your league".to_string()));
        assert_eq!(err.to_string(), "Access denied: Not your league");
        assert_eq!(ApiError::NotFound(None).to_string(), "Resource not found");
    }
}
