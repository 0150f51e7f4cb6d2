//! Backend client error types.

use std::time::Duration;

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Non-success HTTP status; `detail` comes from the `{detail}` body when present.
    #[error("Backend returned {status}: {detail}")]
    Http { status: u16, detail: String },

    /// HTTP 200 whose envelope reports something other than success.
    #[error("Backend reported {status}: {message}")]
    Envelope { status: String, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn http(status: u16, detail: impl Into<String>) -> Self {
        Self::Http {
            status,
            detail: detail.into(),
        }
    }

    pub fn envelope(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Envelope {
            status: status.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Timeout(_) => true,
            ClientError::Network(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status of the failure, when there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Short user-facing description, without the variant prefix.
    pub fn description(&self) -> String {
        match self {
            ClientError::Http { detail, .. } => detail.clone(),
            ClientError::Envelope { message, .. } => message.clone(),
            ClientError::Timeout(budget) => format!("The request timed out after {budget:?}"),
            ClientError::Network(e) if e.is_timeout() => "The request timed out".to_string(),
            ClientError::Network(_) => "Could not reach the backend".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_keeps_detail() {
        let err = ClientError::http(500, "Script not found");
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.description(), "Script not found");
        assert_eq!(err.to_string(), "Backend returned 500: Script not found");
    }

    #[test]
    fn test_timeout_detection() {
        assert!(ClientError::Timeout(Duration::from_secs(30)).is_timeout());
        assert!(!ClientError::envelope("error", "no gpu").is_timeout());
    }

    #[test]
    fn test_sub_second_timeout_keeps_its_budget() {
        let err = ClientError::Timeout(Duration::from_millis(50));
        assert_eq!(err.description(), "The request timed out after 50ms");
        assert_eq!(err.to_string(), "Timeout after 50ms");
    }
}
