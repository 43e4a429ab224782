use serde::Deserialize;
use thiserror::Error;

/// Fallback message when a failed response carries no usable detail
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Refresh token missing or rejected; the user has to log in again
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// The server answered with a failure, carrying its detail message
    #[error("{0}")]
    RequestFailed(String),

    /// No response was received
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Tokens were issued but could not be written to the credential store
    #[error("Failed to save credentials: {0}")]
    StorageError(String),
}

/// Transport-level failure: the request never produced a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::NetworkError(err.0)
    }
}

/// Maximum length for server detail messages surfaced to callers
const MAX_ERROR_DETAIL_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ApiError {
    /// Truncate a detail message to avoid displaying excessive data
    fn truncate_detail(detail: &str) -> String {
        let total = detail.chars().count();
        if total <= MAX_ERROR_DETAIL_LENGTH {
            detail.to_string()
        } else {
            let head: String = detail.chars().take(MAX_ERROR_DETAIL_LENGTH).collect();
            format!("{}... (truncated, {} total chars)", head, total)
        }
    }

    /// The machine-readable `detail` field of an error body, if any
    pub fn detail_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .filter(|d| !d.trim().is_empty())
            .map(|d| Self::truncate_detail(&d))
    }

    /// Build a `RequestFailed` from a non-success response body,
    /// falling back to `fallback` when no detail can be parsed.
    pub fn from_failure_body(body: &str, fallback: &str) -> Self {
        ApiError::RequestFailed(Self::detail_from_body(body).unwrap_or_else(|| fallback.to_string()))
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_body_uses_detail() {
        let err = ApiError::from_failure_body(
            r#"{"detail": "You do not have permission to perform this action."}"#,
            REQUEST_FAILED_MESSAGE,
        );
        assert_eq!(
            err,
            ApiError::RequestFailed("You do not have permission to perform this action.".to_string())
        );
    }

    #[test]
    fn test_failure_body_falls_back_without_detail() {
        assert_eq!(
            ApiError::from_failure_body(r#"{"title": ["This field is required."]}"#, REQUEST_FAILED_MESSAGE),
            ApiError::RequestFailed(REQUEST_FAILED_MESSAGE.to_string())
        );
        assert_eq!(
            ApiError::from_failure_body("<html>oops</html>", REQUEST_FAILED_MESSAGE),
            ApiError::RequestFailed(REQUEST_FAILED_MESSAGE.to_string())
        );
        assert_eq!(
            ApiError::from_failure_body("", "Login failed"),
            ApiError::RequestFailed("Login failed".to_string())
        );
    }

    #[test]
    fn test_long_detail_is_truncated() {
        let body = serde_json::json!({ "detail": "x".repeat(600) }).to_string();
        match ApiError::from_failure_body(&body, REQUEST_FAILED_MESSAGE) {
            ApiError::RequestFailed(detail) => {
                assert!(detail.starts_with(&"x".repeat(500)));
                assert!(detail.ends_with("(truncated, 600 total chars)"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_transport_error_maps_to_network_error() {
        let err: ApiError = TransportError("connection refused".to_string()).into();
        assert_eq!(err, ApiError::NetworkError("connection refused".to_string()));
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
