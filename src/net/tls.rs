//! TLS configuration and certificate loading.

use std::fs;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;
use crate::error::ConfigError;

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, ConfigError> {
    let cert_path = Path::new(&config.cert_path);
    let key_path = Path::new(&config.key_path);

    let cert = read_pem(cert_path, "certificate")?;
    let key = read_pem(key_path, "private key")?;

    let certs = rustls_pemfile::certs(&mut cert.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Tls(format!("{}: {e}", cert_path.display())))?;
    if certs.is_empty() {
        return Err(ConfigError::Tls(format!(
            "no certificates found in {}",
            cert_path.display()
        )));
    }

    match rustls_pemfile::private_key(&mut key.as_slice()) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(ConfigError::Tls(format!(
                "no private key found in {}",
                key_path.display()
            )))
        }
        Err(e) => return Err(ConfigError::Tls(format!("{}: {e}", key_path.display()))),
    }

    RustlsConfig::from_pem(cert, key)
        .await
        .map_err(|e| ConfigError::Tls(e.to_string()))
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|e| ConfigError::Tls(format!("{what} file {}: {e}", path.display())))
}
