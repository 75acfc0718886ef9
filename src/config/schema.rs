//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default maximum request body size: 500 MiB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 500 * 1024 * 1024;

/// Timeouts below this are replaced with [`DEFAULT_TIMEOUT_SECS`].
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Read/write timeout applied when the configured value is too small.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Root configuration for the service binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// Wire-format parser settings.
    pub parser: ParserConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
///
/// Read-only once the listener has started.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Address to listen on: `tcp://host:port`, `host:port`, `:port` or
    /// `unix:///path/to/socket`.
    pub service_address: String,

    /// Octal permission mode applied to a unix socket file (e.g. "0660").
    pub socket_mode: Option<String>,

    /// Request paths accepted for writes (exact match).
    pub paths: BTreeSet<String>,

    /// Attach the request path as a tag on every metric.
    pub path_tag: bool,

    /// HTTP methods accepted in body mode.
    pub methods: BTreeSet<String>,

    /// Headers added to every response.
    pub http_headers: BTreeMap<String, String>,

    /// Request header name → tag name.
    pub http_header_tags: BTreeMap<String, String>,

    /// Where the payload is taken from.
    pub data_source: DataSource,

    /// Request body read timeout in seconds.
    pub read_timeout_secs: u64,

    /// Response write timeout in seconds.
    pub write_timeout_secs: u64,

    /// Maximum accepted payload in bytes. 0 selects the default.
    pub max_body_size: usize,

    /// Status returned after a successful write. 0 selects 204.
    pub http_success_code: u16,

    /// Basic auth username; auth is enforced only when both fields are set.
    pub basic_username: Option<String>,

    /// Basic auth password.
    pub basic_password: Option<String>,

    /// Optional TLS configuration (TCP only).
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            service_address: ":8080".to_string(),
            socket_mode: None,
            paths: BTreeSet::from(["/telegraf".to_string()]),
            path_tag: false,
            methods: BTreeSet::from(["POST".to_string(), "PUT".to_string()]),
            http_headers: BTreeMap::new(),
            http_header_tags: BTreeMap::new(),
            data_source: DataSource::Body,
            read_timeout_secs: DEFAULT_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            http_success_code: 204,
            basic_username: None,
            basic_password: None,
            tls: None,
        }
    }
}

impl ListenerConfig {
    /// Credentials, when both a username and a password are configured.
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (self.basic_username.as_deref(), self.basic_password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// Fill in the defaults `start` relies on.
    pub(crate) fn apply_runtime_defaults(&mut self) {
        if self.max_body_size == 0 {
            self.max_body_size = DEFAULT_MAX_BODY_SIZE;
        }
        if self.read_timeout_secs < MIN_TIMEOUT_SECS {
            self.read_timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        if self.write_timeout_secs < MIN_TIMEOUT_SECS {
            self.write_timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
    }
}

/// Payload location.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Request body, optionally compressed.
    #[default]
    Body,
    /// URL query string, percent-encoded.
    Query,
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Parser configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Data format; only "influx" is built in.
    pub data_format: String,

    /// Unit of timestamps in the payload.
    pub precision: Precision,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            data_format: "influx".to_string(),
            precision: Precision::Nanoseconds,
        }
    }
}

/// Timestamp unit for line protocol.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum Precision {
    #[serde(rename = "ns")]
    #[default]
    Nanoseconds,
    #[serde(rename = "us")]
    Microseconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9273".to_string(),
        }
    }
}
