//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (status codes, octal socket modes)
//! - Reject header names and methods the HTTP layer cannot represent
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the config

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};

use crate::config::schema::{ListenerConfig, ServiceConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the whole service configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = match validate_listener(&config.listener) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if config.parser.data_format != "influx" {
        errors.push(ValidationError::new(
            "parser.data_format",
            format!("unsupported data format {:?}", config.parser.data_format),
        ));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the listener section on its own.
pub fn validate_listener(config: &ListenerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.paths.is_empty() {
        errors.push(ValidationError::new("listener.paths", "at least one path is required"));
    }
    for path in &config.paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "listener.paths",
                format!("{path:?} must start with '/'"),
            ));
        }
    }

    for method in &config.methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "listener.methods",
                format!("invalid method {method:?}"),
            ));
        }
    }

    for (name, value) in &config.http_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "listener.http_headers",
                format!("invalid header name {name:?}"),
            ));
        }
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(
                "listener.http_headers",
                format!("invalid value for header {name:?}"),
            ));
        }
    }

    for header in config.http_header_tags.keys() {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "listener.http_header_tags",
                format!("invalid header name {header:?}"),
            ));
        }
    }

    if config.http_success_code != 0 && StatusCode::from_u16(config.http_success_code).is_err() {
        errors.push(ValidationError::new(
            "listener.http_success_code",
            format!("{} is not an HTTP status", config.http_success_code),
        ));
    }

    if let Some(mode) = &config.socket_mode {
        if parse_socket_mode(mode).is_none() {
            errors.push(ValidationError::new(
                "listener.socket_mode",
                format!("{mode:?} is not an octal mode"),
            ));
        }
    }

    if let Some(tls) = &config.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path are required",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse an octal permission string such as "0660".
pub fn parse_socket_mode(mode: &str) -> Option<u32> {
    let mode = u32::from_str_radix(mode, 8).ok()?;
    (mode <= 0o7777).then_some(mode)
}
