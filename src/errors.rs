use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Main error type for the notification service
#[derive(Debug)]
pub enum NotifyError {
    // HTTP and API errors
    BadRequest(String),

    // Redis errors
    RedisConnection(String),
    RedisQuery(String),
    RedisSerialization(String),

    // Push gateway errors
    PushDelivery(String),

    // Network and HTTP client errors
    NetworkTimeout,
    NetworkConnection(String),
    HttpClient(String),

    // Serialization and parsing errors
    JsonParsing(String),
    JsonSerialization(String),

    // Validation errors
    MissingRequiredField(String),

    // Configuration errors
    InvalidConfiguration(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::BadRequest(msg) => write!(f, "Bad request: {}", msg),

            NotifyError::RedisConnection(msg) => write!(f, "Redis connection error: {}", msg),
            NotifyError::RedisQuery(msg) => write!(f, "Redis query error: {}", msg),
            NotifyError::RedisSerialization(msg) => write!(f, "Redis serialization error: {}", msg),

            NotifyError::PushDelivery(msg) => write!(f, "Push delivery error: {}", msg),

            NotifyError::NetworkTimeout => write!(f, "Network request timed out"),
            NotifyError::NetworkConnection(msg) => write!(f, "Network connection error: {}", msg),
            NotifyError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),

            NotifyError::JsonParsing(msg) => write!(f, "JSON parsing error: {}", msg),
            NotifyError::JsonSerialization(msg) => write!(f, "JSON serialization error: {}", msg),

            NotifyError::MissingRequiredField(field) => write!(f, "Missing required field: {}", field),

            NotifyError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for NotifyError {}

impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            NotifyError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            NotifyError::MissingRequiredField(field) => (
                StatusCode::BAD_REQUEST,
                "missing_field",
                format!("Missing required field: {}", field),
            ),
            NotifyError::JsonParsing(msg) => (StatusCode::BAD_REQUEST, "invalid_json", msg),

            // Everything else is an unexpected failure on our side
            other => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string()),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;

impl From<redis::RedisError> for NotifyError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => NotifyError::RedisConnection(err.to_string()),
            redis::ErrorKind::AuthenticationFailed => {
                NotifyError::RedisConnection("Authentication failed".to_string())
            }
            _ => NotifyError::RedisQuery(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotifyError::NetworkTimeout
        } else if err.is_connect() {
            NotifyError::NetworkConnection(err.to_string())
        } else if err.is_decode() {
            NotifyError::JsonParsing(err.to_string())
        } else {
            NotifyError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_eof() {
            NotifyError::JsonParsing(err.to_string())
        } else {
            NotifyError::JsonSerialization(err.to_string())
        }
    }
}

impl NotifyError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        NotifyError::BadRequest(msg.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        NotifyError::MissingRequiredField(field.into())
    }
}
