//! Shared utilities for listener integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use bytes::Bytes;
use http_listener::net::LocalAddr;
use http_listener::{ChannelSink, HttpListener, LineProtocolParser, ListenerConfig, Metric};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::UnboundedReceiver;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A socket path no other test in this process will use.
pub fn unique_socket_path(name: &str) -> PathBuf {
    let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "http-listener-it-{}-{id}-{name}.sock",
        std::process::id()
    ))
}

/// Config bound to an ephemeral loopback port.
pub fn loopback_config() -> ListenerConfig {
    ListenerConfig {
        service_address: "127.0.0.1:0".to_string(),
        ..Default::default()
    }
}

/// Initialize and start a listener; metrics arrive on the returned receiver.
pub async fn start_listener(config: ListenerConfig) -> (Arc<HttpListener>, UnboundedReceiver<Metric>) {
    let mut listener = HttpListener::new(config, Arc::new(LineProtocolParser::default()));
    listener.init().await.expect("init failed");

    let (sink, rx) = ChannelSink::new();
    listener.start(Arc::new(sink)).expect("start failed");
    (Arc::new(listener), rx)
}

/// Base URL of a TCP listener.
pub fn base_url(listener: &HttpListener) -> String {
    match listener.local_addr() {
        Some(LocalAddr::Tcp(addr)) => format!("http://{addr}"),
        other => panic!("not a tcp listener: {other:?}"),
    }
}

/// Make aws-lc-rs the process TLS provider before any client is built.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

pub fn client() -> reqwest::Client {
    install_crypto_provider();
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Wait for the next forwarded metric.
pub async fn next_metric(rx: &mut UnboundedReceiver<Metric>) -> Metric {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no metric forwarded")
        .expect("sink closed")
}

/// Send one HTTP/1.1 request over an established stream.
pub async fn send_over<S>(stream: S, request: Request<Body>) -> (Response<()>, Bytes)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let response = sender.send_request(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(Body::new(body), usize::MAX).await.unwrap();
    (Response::from_parts(parts, ()), bytes)
}

/// Send one HTTP/1.1 request over TCP.
pub async fn tcp_request(listener: &HttpListener, request: Request<Body>) -> (Response<()>, Bytes) {
    let Some(LocalAddr::Tcp(addr)) = listener.local_addr() else {
        panic!("not a tcp listener");
    };
    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    send_over(stream, request).await
}

/// Send one HTTP/1.1 request over a unix socket.
#[cfg(unix)]
pub async fn unix_request(path: &Path, request: Request<Body>) -> (Response<()>, Bytes) {
    let stream = tokio::net::UnixStream::connect(path).await.unwrap();
    send_over(stream, request).await
}
