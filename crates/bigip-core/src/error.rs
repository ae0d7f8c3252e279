//! Error types for BIG-IP operations.
//!
//! This module provides the error type shared by every BIG-IP client crate, including HTTP
//! status code mapping and decoding of the JSON error bodies returned by iControl REST.

use serde::Deserialize;
use thiserror::Error;

/// Main error type for BIG-IP operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// BIG-IP management interface is unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Failed to parse a response body
    #[error("Failed to parse BIG-IP response: {0}")]
    ParseError(String),

    /// Invalid partition path or object name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for BIG-IP: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Bad request with details
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication or authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Conflict error (object already exists, object in use, ...)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error reported by the iControl REST API
    #[error("BIG-IP API error {status}: {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for BIG-IP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by iControl REST on failed requests.
///
/// ```json
/// {"code":404,"message":"01020036:3: The requested Partition (/nope) was not found.","errorStack":[],"apiError":3}
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// HTTP status echoed by the device
    #[serde(default)]
    pub code: Option<u16>,
    /// Human-readable message, usually prefixed with a TMOS error code
    #[serde(default)]
    pub message: Option<String>,
    /// Java stack frames from the REST framework
    #[serde(default)]
    pub error_stack: Vec<String>,
    /// Internal API error category
    #[serde(default)]
    pub api_error: Option<u32>,
}

impl ApiErrorBody {
    /// Attempts to decode an error body, returning `None` when it is not BIG-IP JSON.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    /// Returns the most useful message for the body, falling back to the raw text.
    #[must_use]
    pub fn describe(text: &str) -> String {
        Self::parse(text)
            .and_then(|body| body.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| text.trim().to_string())
    }
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidPath(_) => "INVALID_PATH",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::ApiError { .. } => "API_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns true if the failure is transient and the request may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::Timeout(_) | Self::HttpError(_)
        )
    }

    /// Returns true if this error reports a missing object.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ServiceUnavailable("test".to_string()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(
            Error::ParseError("test".to_string()).error_code(),
            "PARSE_ERROR"
        );
        assert_eq!(
            Error::InvalidPath("test".to_string()).error_code(),
            "INVALID_PATH"
        );
        assert_eq!(
            Error::Unauthorized("test".to_string()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(Error::Conflict("test".to_string()).error_code(), "CONFLICT");
        assert_eq!(
            Error::ApiError {
                status: 418,
                message: "teapot".to_string()
            }
            .error_code(),
            "API_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("/Common/app".to_string());
        assert_eq!(err.to_string(), "Not found: /Common/app");

        let err = Error::ApiError {
            status: 422,
            message: "bad monitor".to_string(),
        };
        assert_eq!(err.to_string(), "BIG-IP API error 422: bad monitor");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::ServiceUnavailable("x".to_string()).is_retryable());
        assert!(Error::Timeout("x".to_string()).is_retryable());
        assert!(Error::HttpError("x".to_string()).is_retryable());

        assert!(!Error::NotFound("x".to_string()).is_retryable());
        assert!(!Error::Unauthorized("x".to_string()).is_retryable());
        assert!(!Error::Conflict("x".to_string()).is_retryable());
    }

    #[test]
    fn test_api_error_body_parse() {
        let text = r#"{"code":404,"message":"01020036:3: The requested Partition (/nope) was not found.","errorStack":[],"apiError":3}"#;
        let body = ApiErrorBody::parse(text).unwrap();
        assert_eq!(body.code, Some(404));
        assert_eq!(body.api_error, Some(3));
        assert!(body.error_stack.is_empty());
        assert_eq!(
            ApiErrorBody::describe(text),
            "01020036:3: The requested Partition (/nope) was not found."
        );
    }

    #[test]
    fn test_api_error_body_describe_falls_back_to_text() {
        assert_eq!(ApiErrorBody::describe("  upstream reset \n"), "upstream reset");
        assert_eq!(ApiErrorBody::describe(r#"{"code":500}"#), r#"{"code":500}"#);
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let bigip_err: Error = err.into();
        assert!(matches!(bigip_err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let bigip_err: Error = err.into();
        assert!(matches!(bigip_err, Error::ParseError(_)));
    }

    #[test]
    fn test_error_partial_eq() {
        let err1 = Error::NotFound("test".to_string());
        let err2 = Error::NotFound("test".to_string());
        let err3 = Error::NotFound("other".to_string());

        assert_eq!(err1, err2.clone());
        assert_ne!(err1, err3);
        assert!(err2.is_not_found());
    }
}
