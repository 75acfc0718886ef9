//! Socket binding.
//!
//! # Responsibilities
//! - Bind a TCP listener for `tcp` addresses
//! - For `unix` addresses: remove a stale socket file, bind, apply the mode
//! - Report the bound address for logging and tests

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::config::validation::parse_socket_mode;
use crate::error::BindError;
use crate::net::address::ServiceAddress;

/// A bound, listening socket that has not been handed to a server yet.
#[derive(Debug)]
pub enum BoundSocket {
    Tcp(std::net::TcpListener),
    #[cfg(unix)]
    Unix(tokio::net::UnixListener, PathBuf),
}

/// The address a listener actually bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAddr {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl fmt::Display for LocalAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalAddr::Tcp(addr) => write!(f, "{addr}"),
            LocalAddr::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

impl BoundSocket {
    /// Bind the configured address. Must be called from within a Tokio runtime.
    pub fn bind(address: &ServiceAddress, socket_mode: Option<&str>) -> Result<Self, BindError> {
        match address {
            ServiceAddress::Tcp(addr) => bind_tcp(addr),
            ServiceAddress::Unix(path) => bind_unix(path, socket_mode),
        }
    }

    pub fn local_addr(&self) -> Result<LocalAddr, std::io::Error> {
        match self {
            BoundSocket::Tcp(listener) => listener.local_addr().map(LocalAddr::Tcp),
            #[cfg(unix)]
            BoundSocket::Unix(_, path) => Ok(LocalAddr::Unix(path.clone())),
        }
    }
}

fn bind_tcp(addr: &str) -> Result<BoundSocket, BindError> {
    let bind_err = |source| BindError::Bind {
        address: addr.to_string(),
        source,
    };
    let listener = std::net::TcpListener::bind(addr).map_err(bind_err)?;
    listener.set_nonblocking(true).map_err(bind_err)?;

    tracing::debug!(address = %addr, "TCP socket bound");
    Ok(BoundSocket::Tcp(listener))
}

#[cfg(unix)]
fn bind_unix(path: &Path, socket_mode: Option<&str>) -> Result<BoundSocket, BindError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = socket_mode
        .map(|raw| parse_socket_mode(raw).ok_or_else(|| BindError::SocketMode(raw.to_string())))
        .transpose()?;

    remove_stale_socket(path)?;

    let listener = tokio::net::UnixListener::bind(path).map_err(|source| BindError::Bind {
        address: path.display().to_string(),
        source,
    })?;

    if let Some(mode) = mode {
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)) {
            drop(listener);
            let _ = std::fs::remove_file(path);
            return Err(BindError::Chmod(e));
        }
    }

    tracing::debug!(path = %path.display(), mode = ?mode.map(|m| format!("{m:o}")), "Unix socket bound");
    Ok(BoundSocket::Unix(listener, path.to_path_buf()))
}

#[cfg(not(unix))]
fn bind_unix(path: &Path, _socket_mode: Option<&str>) -> Result<BoundSocket, BindError> {
    Err(BindError::Bind {
        address: path.display().to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "unix sockets are not supported on this platform",
        ),
    })
}

/// Remove a leftover socket file; a missing file is not an error.
pub fn remove_stale_socket(path: &Path) -> Result<(), BindError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stale socket file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BindError::RemoveStale(e)),
    }
}
