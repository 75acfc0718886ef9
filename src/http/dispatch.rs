//! Request dispatch.
//!
//! # Data Flow
//! ```text
//! Request
//!     → path allow-list (404)
//!     → Basic Auth (401)
//!     → drain gate (410)
//!     → declared Content-Length (413)
//!     → method allow-list, body mode only (405)
//!     → codec, bounded by the read timeout (400 / 413)
//!     → parser (400)
//!     → forward.rs (tags, sink)
//!     → success status, empty body
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::codec::{decode_body, decode_query, ContentEncoding, DecodeError};
use crate::config::{DataSource, ListenerConfig};
use crate::error::ProtocolError;
use crate::http::forward::{forward_batch, RequestTags};
use crate::lifecycle::Shutdown;
use crate::observability::{metrics, tracing::make_request_span};
use crate::parser::{parse_payload, Parser};
use crate::security::{headers::with_static_headers, BasicAuth};
use crate::sink::Sink;

/// Per-listener state shared by every request handler.
#[derive(Clone)]
pub(crate) struct ListenerState {
    pub config: Arc<ListenerConfig>,
    pub success: StatusCode,
    pub auth: Option<BasicAuth>,
    pub parser: Arc<dyn Parser>,
    pub sink: Arc<dyn Sink>,
    pub shutdown: Shutdown,
}

/// Build the router serving a single listener.
pub(crate) fn build_router(state: ListenerState, static_headers: &[(HeaderName, HeaderValue)]) -> Router {
    let read_timeout = Duration::from_secs(state.config.read_timeout_secs);
    let write_timeout = Duration::from_secs(state.config.write_timeout_secs);

    let router = Router::new()
        .fallback(handle_request)
        .with_state(state)
        .layer(TimeoutLayer::new(write_timeout));
    with_static_headers(router, static_headers)
        .layer(RequestBodyTimeoutLayer::new(read_timeout))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn handle_request(State(state): State<ListenerState>, request: Request) -> Response {
    let start = Instant::now();
    let response = match dispatch(&state, request).await {
        Ok(status) => status.into_response(),
        Err(err) => {
            tracing::debug!(error = %err, status = %err.status(), "Request rejected");
            err.into_response()
        }
    };
    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn dispatch(state: &ListenerState, request: Request<Body>) -> Result<StatusCode, ProtocolError> {
    let config = &state.config;
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    if !config.paths.contains(path) {
        return Err(ProtocolError::NotFound);
    }

    if let Some(auth) = &state.auth {
        if !auth.verify(&parts.headers) {
            return Err(ProtocolError::Unauthorized);
        }
    }

    if state.shutdown.is_triggered() {
        return Err(ProtocolError::Gone);
    }

    let limit = config.max_body_size;
    if declared_length(&parts.headers).is_some_and(|len| len > limit as u64) {
        return Err(ProtocolError::TooLarge);
    }

    let payload = match config.data_source {
        DataSource::Body => {
            if !config.methods.contains(parts.method.as_str()) {
                return Err(ProtocolError::MethodNotAllowed);
            }
            let encoding = ContentEncoding::from_headers(&parts.headers);
            let read_timeout = Duration::from_secs(config.read_timeout_secs);
            tokio::time::timeout(read_timeout, decode_body(encoding, body, limit))
                .await
                .map_err(|_| DecodeError::ReadTimeout(read_timeout))??
        }
        DataSource::Query => decode_query(parts.uri.query().unwrap_or_default(), limit)?,
    };
    metrics::record_body_bytes(payload.len());

    let batch = parse_payload(state.parser.as_ref(), &payload)?;

    let tags = RequestTags {
        headers: &parts.headers,
        header_tags: &config.http_header_tags,
        path: config.path_tag.then_some(path),
    };
    let forwarded = forward_batch(state.sink.as_ref(), &tags, batch);
    metrics::record_forwarded(forwarded);
    tracing::trace!(metrics = forwarded, "Batch forwarded");

    Ok(state.success)
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
