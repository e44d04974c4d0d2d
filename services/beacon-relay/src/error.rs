use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ErrorResponse;

/// Failures talking to the message store. The `Display` text is what the
/// relay hands back to its caller in the `error` field.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database timeout")]
    Timeout,
    #[error("Database error: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
    #[error("Invalid database response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for environment variable {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug)]
pub struct ServiceError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ServiceError {
    pub fn new(status: StatusCode, error: String) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error,
                success: false,
            },
        }
    }

    pub fn no_data() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "No data provided".to_string())
    }

    /// The write path distinguishes a store timeout from every other failure.
    pub fn from_insert(err: StoreError) -> Self {
        let status = if err.is_timeout() {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }

    /// The read path reports every store failure, timeouts included, as 500.
    pub fn from_select(err: StoreError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
