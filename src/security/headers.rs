//! Static response headers.
//!
//! Every configured header is added to every response, including 401/404/410,
//! unless the handler already set it (e.g. `Content-Type` on JSON errors).

use std::collections::BTreeMap;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::ConfigError;

/// Parse configured headers into their typed form.
pub fn parse_static_headers(
    headers: &BTreeMap<String, String>,
) -> Result<Vec<(HeaderName, HeaderValue)>, ConfigError> {
    headers
        .iter()
        .map(|(name, value)| {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::Header(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| ConfigError::Header(name.to_string()))?;
            Ok((name, value))
        })
        .collect()
}

/// Layer each static header onto the router.
pub fn with_static_headers<S>(
    mut router: Router<S>,
    headers: &[(HeaderName, HeaderValue)],
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    for (name, value) in headers {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            name.clone(),
            value.clone(),
        ));
    }
    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_headers() {
        let headers = BTreeMap::from([
            ("Server".to_string(), "metrics-listener".to_string()),
            ("X-Frame-Options".to_string(), "DENY".to_string()),
        ]);
        let parsed = parse_static_headers(&headers).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, "server");
    }

    #[test]
    fn rejects_invalid_name() {
        let headers = BTreeMap::from([("bad name".to_string(), "v".to_string())]);
        assert!(matches!(
            parse_static_headers(&headers),
            Err(ConfigError::Header(name)) if name == "bad name"
        ));
    }
}
