//! Service address parsing.

use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Where the listener binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceAddress {
    /// `host:port`; an empty host binds every interface.
    Tcp(String),
    /// Filesystem path of a unix domain socket.
    Unix(PathBuf),
}

impl ServiceAddress {
    /// Parse `tcp://host:port`, `host:port`, `:port` or `unix:///path`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (scheme, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => {
                if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(ConfigError::Address(raw.to_string()));
                }
                (scheme, rest)
            }
            None => ("tcp", raw),
        };

        match scheme {
            "tcp" => Self::parse_tcp(rest).ok_or_else(|| ConfigError::Address(raw.to_string())),
            "unix" if !rest.is_empty() => Ok(ServiceAddress::Unix(PathBuf::from(rest))),
            "unix" => Err(ConfigError::Address(raw.to_string())),
            other => Err(ConfigError::UnknownScheme(other.to_string())),
        }
    }

    fn parse_tcp(rest: &str) -> Option<Self> {
        if rest.contains('/') {
            return None;
        }
        let (host, port) = rest.rsplit_once(':')?;
        let port: u16 = port.parse().ok()?;
        let host = if host.is_empty() { "0.0.0.0" } else { host };
        Some(ServiceAddress::Tcp(format!("{host}:{port}")))
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            ServiceAddress::Tcp(_) => "tcp",
            ServiceAddress::Unix(_) => "unix",
        }
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceAddress::Tcp(addr) => write!(f, "tcp://{addr}"),
            ServiceAddress::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
