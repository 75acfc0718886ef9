//! HTTP Basic Auth.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use subtle::ConstantTimeEq;

use crate::config::ListenerConfig;

/// The single credential pair accepted by a listener.
#[derive(Clone)]
pub struct BasicAuth {
    username: Vec<u8>,
    password: Vec<u8>,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicAuth {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.as_bytes().to_vec(),
            password: password.as_bytes().to_vec(),
        }
    }

    /// `None` when the listener does not require authentication.
    pub fn from_config(config: &ListenerConfig) -> Option<Self> {
        config
            .basic_credentials()
            .map(|(user, pass)| Self::new(user, pass))
    }

    /// Check the `Authorization` header against the configured credentials.
    pub fn verify(&self, headers: &HeaderMap) -> bool {
        let Some((user, pass)) = basic_credentials(headers) else {
            return false;
        };
        // Both comparisons always run.
        let matched = user.ct_eq(&self.username) & pass.ct_eq(&self.password);
        bool::from(matched)
    }
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
fn basic_credentials(headers: &HeaderMap) -> Option<(Vec<u8>, Vec<u8>)> {
    let value = headers.get(header::AUTHORIZATION)?.as_bytes();
    if value.len() < 6 {
        return None;
    }
    let (scheme, encoded) = value.split_at(6);
    if !scheme.eq_ignore_ascii_case(b"Basic ") {
        return None;
    }
    let decoded = BASE64.decode(encoded).ok()?;
    let idx = decoded.iter().position(|&b| b == b':')?;
    Some((decoded[..idx].to_vec(), decoded[idx + 1..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn basic(user: &str, pass: &str) -> HeaderMap {
        headers_with(&format!("Basic {}", BASE64.encode(format!("{user}:{pass}"))))
    }

    #[test]
    fn accepts_matching_credentials() {
        let auth = BasicAuth::new("test", "super secure");
        assert!(auth.verify(&basic("test", "super secure")));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let auth = BasicAuth::new("u", "p");
        assert!(auth.verify(&headers_with(&format!("basic {}", BASE64.encode("u:p")))));
    }

    #[test]
    fn password_may_contain_colons() {
        let auth = BasicAuth::new("u", "a:b");
        assert!(auth.verify(&basic("u", "a:b")));
    }

    #[test]
    fn single_character_mismatch_fails() {
        let auth = BasicAuth::new("test", "secret");
        assert!(!auth.verify(&basic("tesT", "secret")));
        assert!(!auth.verify(&basic("test", "secreT")));
        assert!(!auth.verify(&basic("test", "secret!")));
    }

    #[test]
    fn missing_or_malformed_header_fails() {
        let auth = BasicAuth::new("test", "secret");
        assert!(!auth.verify(&HeaderMap::new()));
        assert!(!auth.verify(&headers_with("Bearer abc")));
        assert!(!auth.verify(&headers_with("Basic !!!notbase64")));
        assert!(!auth.verify(&headers_with(&format!("Basic {}", BASE64.encode("nocolon")))));
        assert!(!auth.verify(&headers_with("Basic")));
    }

    #[test]
    fn config_needs_both_fields() {
        let config = ListenerConfig {
            basic_password: Some("p".into()),
            ..Default::default()
        };
        assert!(BasicAuth::from_config(&config).is_none());
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", BasicAuth::new("u", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
