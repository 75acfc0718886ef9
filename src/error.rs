//! Error types for the listener.
//!
//! Only [`ConfigError`] and [`BindError`] ever reach the caller of
//! `init`/`start`. Everything raised while serving a request is a
//! [`ProtocolError`] and is turned into an HTTP status inside the request path.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::ValidationError;

/// Failure while validating configuration or building TLS material.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parsing address failed: {0}")]
    Address(String),

    #[error("unknown protocol {0:?}")]
    UnknownScheme(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("invalid static header {0:?}")]
    Header(String),

    #[error("invalid success status code {0}")]
    SuccessCode(u16),

    #[error("listener already initialized")]
    AlreadyInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure while acquiring the socket in `start`.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("listener is not initialized")]
    NotInitialized,

    #[error("listener already started")]
    AlreadyStarted,

    #[error("removing socket failed: {0}")]
    RemoveStale(std::io::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("converting socket mode failed: {0:?}")]
    SocketMode(String),

    #[error("changing socket permissions failed: {0}")]
    Chmod(std::io::Error),

    #[error("TLS is not supported on unix sockets")]
    TlsOverUnix,
}

/// Unexpected failure of the serving task.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("serve failed: {0}")]
    Serve(#[from] std::io::Error),

    #[error("serving task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The parser rejected a decoded payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Request-local failure, mapped to a status code and a fixed body.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("path not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("listener is draining")]
    Gone,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("request body too large")]
    TooLarge,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
}

impl ProtocolError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProtocolError::NotFound => StatusCode::NOT_FOUND,
            ProtocolError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProtocolError::Gone => StatusCode::GONE,
            ProtocolError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProtocolError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProtocolError::BadRequest(_) | ProtocolError::Parse(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Fixed client-facing message; `None` means no body is written.
    fn client_message(&self) -> Option<&'static str> {
        match self {
            ProtocolError::MethodNotAllowed => Some("http: method not allowed"),
            ProtocolError::TooLarge => Some("http: request body too large"),
            ProtocolError::BadRequest(_) | ProtocolError::Parse(_) => Some("http: bad request"),
            ProtocolError::NotFound | ProtocolError::Unauthorized | ProtocolError::Gone => None,
        }
    }
}

impl IntoResponse for ProtocolError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.client_message() {
            Some(message) => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                serde_json::json!({ "error": message }).to_string(),
            )
                .into_response(),
            None => status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_detail_is_not_disclosed() {
        let err = ProtocolError::Parse(ParseError::new(3, "secret parser internals"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), Some("http: bad request"));
    }

    #[test]
    fn bodiless_statuses() {
        for err in [ProtocolError::NotFound, ProtocolError::Unauthorized, ProtocolError::Gone] {
            assert!(err.client_message().is_none());
        }
        assert_eq!(ProtocolError::Gone.status(), StatusCode::GONE);
    }
}
