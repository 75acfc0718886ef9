//! Listener lifecycle.
//!
//! # Responsibilities
//! - Validate configuration and prepare TLS material (`init`)
//! - Own the socket and the serving task (`start`)
//! - Drain in-flight requests and release the socket (`stop`)
//!
//! # Lifecycle
//! ```text
//! Uninitialized → Initialized → Listening → Draining → Closed
//! ```
//! Transitions are one-way. `stop` is safe to call from several tasks at once
//! and more than once.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    serve::Listener,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::validation::validate_listener;
use crate::config::ListenerConfig;
use crate::error::{BindError, ConfigError, TransportError};
use crate::http::dispatch::{build_router, ListenerState};
use crate::lifecycle::Shutdown;
use crate::net::{address::ServiceAddress, listener::remove_stale_socket, BoundSocket, LocalAddr};
use crate::net::tls::load_tls_config;
use crate::parser::Parser;
use crate::security::{headers::parse_static_headers, BasicAuth};
use crate::sink::Sink;

/// Default status for accepted writes.
const DEFAULT_SUCCESS_CODE: u16 = 204;

/// Lifecycle state of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerPhase {
    Uninitialized,
    Initialized,
    Listening,
    Draining,
    Closed,
}

/// Everything `init` derives from the configuration.
struct Prepared {
    address: ServiceAddress,
    tls: Option<RustlsConfig>,
    success: StatusCode,
    auth: Option<BasicAuth>,
    static_headers: Vec<(HeaderName, HeaderValue)>,
}

/// Push-based HTTP metrics listener.
pub struct HttpListener {
    config: ListenerConfig,
    parser: Arc<dyn Parser>,
    prepared: Option<Prepared>,
    phase: watch::Sender<ListenerPhase>,
    shutdown: Shutdown,
    worker: Mutex<Option<JoinHandle<()>>>,
    local_addr: Option<LocalAddr>,
}

impl HttpListener {
    /// Create an uninitialized listener.
    pub fn new(config: ListenerConfig, parser: Arc<dyn Parser>) -> Self {
        let (phase, _) = watch::channel(ListenerPhase::Uninitialized);
        Self {
            config,
            parser,
            prepared: None,
            phase,
            shutdown: Shutdown::new(),
            worker: Mutex::new(None),
            local_addr: None,
        }
    }

    /// Validate the configuration and build TLS material.
    ///
    /// On failure the listener stays `Uninitialized` and `init` may be retried.
    pub async fn init(&mut self) -> Result<(), ConfigError> {
        if self.phase() != ListenerPhase::Uninitialized {
            return Err(ConfigError::AlreadyInitialized);
        }

        validate_listener(&self.config).map_err(ConfigError::Validation)?;
        let address = ServiceAddress::parse(&self.config.service_address)?;

        let code = match self.config.http_success_code {
            0 => DEFAULT_SUCCESS_CODE,
            code => code,
        };
        let success = StatusCode::from_u16(code).map_err(|_| ConfigError::SuccessCode(code))?;
        let static_headers = parse_static_headers(&self.config.http_headers)?;

        let tls = match &self.config.tls {
            Some(tls) => Some(load_tls_config(tls).await?),
            None => None,
        };

        self.config.http_success_code = code;
        self.prepared = Some(Prepared {
            address,
            tls,
            success,
            auth: BasicAuth::from_config(&self.config),
            static_headers,
        });
        self.phase.send_replace(ListenerPhase::Initialized);
        tracing::debug!(address = %self.config.service_address, "Listener initialized");
        Ok(())
    }

    /// Bind the socket and spawn the serving task.
    ///
    /// Returns once the socket is bound; the task keeps running until `stop`.
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, sink: Arc<dyn Sink>) -> Result<(), BindError> {
        match self.phase() {
            ListenerPhase::Initialized => {}
            ListenerPhase::Uninitialized => return Err(BindError::NotInitialized),
            _ => return Err(BindError::AlreadyStarted),
        }
        let prepared = self.prepared.as_ref().ok_or(BindError::NotInitialized)?;

        if prepared.tls.is_some() && matches!(prepared.address, ServiceAddress::Unix(_)) {
            return Err(BindError::TlsOverUnix);
        }

        self.config.apply_runtime_defaults();
        let socket = BoundSocket::bind(&prepared.address, self.config.socket_mode.as_deref())?;
        let local_addr = socket.local_addr().map_err(|source| BindError::Bind {
            address: prepared.address.to_string(),
            source,
        })?;

        let state = ListenerState {
            config: Arc::new(self.config.clone()),
            success: prepared.success,
            auth: prepared.auth.clone(),
            parser: self.parser.clone(),
            sink,
            shutdown: self.shutdown.clone(),
        };
        let router = build_router(state, &prepared.static_headers);

        tracing::info!(
            address = %local_addr,
            scheme = prepared.address.scheme(),
            tls = prepared.tls.is_some(),
            "Listening"
        );

        let handle = spawn_serve(
            socket,
            router,
            prepared.tls.clone(),
            Duration::from_secs(self.config.read_timeout_secs),
            self.shutdown.clone(),
        );
        *self.worker.get_mut() = Some(handle);
        self.local_addr = Some(local_addr);
        self.phase.send_replace(ListenerPhase::Listening);
        Ok(())
    }

    /// Stop accepting, drain in-flight requests and release the socket.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        if self.phase() == ListenerPhase::Closed {
            return;
        }

        self.phase.send_replace(ListenerPhase::Draining);
        self.shutdown.trigger();

        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %TransportError::from(e), "Serving task ended abnormally");
            }
        }

        if let Some(path) = self.unix_path() {
            if let Err(e) = remove_stale_socket(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove socket file");
            }
        }

        self.phase.send_replace(ListenerPhase::Closed);
        tracing::info!("Listener stopped");
    }

    pub fn phase(&self) -> ListenerPhase {
        *self.phase.borrow()
    }

    /// The bound address, once started.
    pub fn local_addr(&self) -> Option<&LocalAddr> {
        self.local_addr.as_ref()
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    fn unix_path(&self) -> Option<PathBuf> {
        match &self.local_addr {
            Some(LocalAddr::Unix(path)) => Some(path.clone()),
            _ => None,
        }
    }
}

impl Drop for HttpListener {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

fn spawn_serve(
    socket: BoundSocket,
    router: Router,
    tls: Option<RustlsConfig>,
    read_timeout: Duration,
    shutdown: Shutdown,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = serve(socket, router, tls, read_timeout, shutdown.clone()).await;

        // `trigger` only returns true when nothing had asked us to stop.
        if shutdown.trigger() {
            match result {
                Ok(()) => tracing::warn!("Serving task exited unexpectedly"),
                Err(e) => tracing::error!(error = %e, "Serving task failed"),
            }
        } else if let Err(e) = result {
            tracing::error!(error = %e, "Serving task failed while draining");
        }
    })
}

async fn serve(
    socket: BoundSocket,
    router: Router,
    tls: Option<RustlsConfig>,
    read_timeout: Duration,
    shutdown: Shutdown,
) -> Result<(), TransportError> {
    match socket {
        BoundSocket::Tcp(listener) => match tls {
            Some(tls) => serve_tls(listener, router, tls, read_timeout, shutdown).await,
            None => {
                let listener = tokio::net::TcpListener::from_std(listener)?;
                serve_plain(listener, router, read_timeout, shutdown).await;
                Ok(())
            }
        },
        #[cfg(unix)]
        BoundSocket::Unix(listener, _) => {
            serve_plain(listener, router, read_timeout, shutdown).await;
            Ok(())
        }
    }
}

/// Accept connections until shutdown fires, then wait for open ones to finish.
///
/// Every connection gets a header read deadline, so a peer that stalls
/// mid-request cannot hold the drain open.
async fn serve_plain<L>(mut listener: L, router: Router, read_timeout: Duration, shutdown: Shutdown)
where
    L: Listener,
{
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout);

    let graceful = GracefulShutdown::new();
    let stopped = shutdown.wait();
    tokio::pin!(stopped);

    loop {
        tokio::select! {
            (io, _) = listener.accept() => {
                let service = TowerToHyperService::new(router.clone());
                let conn = graceful.watch(builder.serve_connection(TokioIo::new(io), service));
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        tracing::debug!(error = %e, "Connection closed with error");
                    }
                });
            }
            _ = &mut stopped => break,
        }
    }

    drop(listener);
    graceful.shutdown().await;
}

async fn serve_tls(
    listener: std::net::TcpListener,
    router: Router,
    tls: RustlsConfig,
    read_timeout: Duration,
    shutdown: Shutdown,
) -> Result<(), TransportError> {
    let handle = axum_server::Handle::new();
    let drain = handle.clone();
    tokio::spawn(async move {
        shutdown.wait().await;
        drain.graceful_shutdown(None);
    });

    let mut server = axum_server::from_tcp_rustls(listener, tls).handle(handle);
    server
        .http_builder()
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout);
    server.serve(router.into_make_service()).await?;
    Ok(())
}
